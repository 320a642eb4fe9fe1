use serde::{Deserialize, Serialize};

use crate::validator::{max_chars, not_blank, permitted_value, Validatable, Validator};

pub const PERMITTED_EXPIRES: [i32; 3] = [1, 7, 365];

#[derive(Debug, Deserialize, Serialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expires: i32,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: 365,
            validator: Validator::default(),
        }
    }
}

impl Validatable for SnippetCreateForm {
    fn validator(&self) -> &Validator {
        &self.validator
    }
    fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }
}

impl SnippetCreateForm {
    pub fn validate(&mut self) {
        let title_ok = not_blank(&self.title);
        let title_short = max_chars(&self.title, 100);
        let content_ok = not_blank(&self.content);
        let expires_ok = permitted_value(&self.expires, &PERMITTED_EXPIRES);

        self.check_field(title_ok, "title", "This field cannot be blank");
        self.check_field(
            title_short,
            "title",
            "This field cannot be more than 100 characters long",
        );
        self.check_field(content_ok, "content", "This field cannot be blank");
        self.check_field(expires_ok, "expires", "This field must equal 1, 7 or 365");
    }
}

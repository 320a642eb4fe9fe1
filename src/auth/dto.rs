use serde::{Deserialize, Serialize};

use crate::validator::{matches, min_chars, not_blank, Validatable, Validator, EMAIL_RX};

pub const MIN_PASSWORD_CHARS: usize = 8;

/// Form body for `POST /user/signup`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserSignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

/// Form body for `POST /user/login`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl Validatable for UserSignupForm {
    fn validator(&self) -> &Validator {
        &self.validator
    }
    fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }
}

impl Validatable for UserLoginForm {
    fn validator(&self) -> &Validator {
        &self.validator
    }
    fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }
}

fn check_email(form: &mut impl Validatable, email: &str) {
    let present = not_blank(email);
    let well_formed = matches(email, &EMAIL_RX);
    form.check_field(present, "email", "This field cannot be blank");
    form.check_field(well_formed, "email", "This field must be a valid email address");
}

impl UserSignupForm {
    pub fn validate(&mut self) {
        self.email = self.email.trim().to_string();
        let email = self.email.clone();

        let name_ok = not_blank(&self.name);
        let password_ok = not_blank(&self.password);
        let password_long = min_chars(&self.password, MIN_PASSWORD_CHARS);

        self.check_field(name_ok, "name", "This field cannot be blank");
        check_email(self, &email);
        self.check_field(password_ok, "password", "This field cannot be blank");
        self.check_field(
            password_long,
            "password",
            "This field must be at least 8 characters long",
        );
    }
}

impl UserLoginForm {
    pub fn validate(&mut self) {
        self.email = self.email.trim().to_string();
        let email = self.email.clone();
        let password_ok = not_blank(&self.password);

        check_email(self, &email);
        self.check_field(password_ok, "password", "This field cannot be blank");
    }
}

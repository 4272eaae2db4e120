mod client;
mod dto;

use lazy_static::lazy_static;
use regex::Regex;

pub use client::{UsersClient, USERS_PATH};
pub use dto::{NewUser, User, UserPatch};

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles");
    }
    EMAIL_RE.is_match(email)
}

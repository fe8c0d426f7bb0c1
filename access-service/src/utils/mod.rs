pub mod password;
pub mod validation;

pub use password::{
    generate_password, hash_password, verify_password, Password, PasswordHashString,
};
pub use validation::{validate_email, validate_name};

//! Form-level checks run before any request is sent.

use thiserror::Error;

/// Maximum username length accepted by the forms
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Minimum password length for new accounts
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length accepted by the forms
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Animals the image generator knows how to draw.
pub const AVAILABLE_ANIMALS: &[&str] = &[
    "dog", "cat", "lion", "tiger", "elephant", "penguin", "panda", "koala", "giraffe", "dolphin",
    "fox", "wolf", "rabbit", "cow", "horse", "sheep", "goat", "pig", "chicken", "duck", "turkey",
    "peacock", "parrot", "pigeon", "sparrow", "rooster", "hen", "cock", "fish", "shark", "whale",
    "octopus", "crab", "lobster", "snail", "butterfly", "bee", "ant", "spider", "snake", "lizard",
    "turtle", "tortoise", "bird", "owl", "eagle", "hawk", "falcon",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username and password required")]
    MissingCredentials,

    #[error("Username must be at most {} characters", MAX_USERNAME_LENGTH)]
    UsernameTooLong,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    #[error("Password must be at most {} characters", MAX_PASSWORD_LENGTH)]
    PasswordTooLong,

    #[error("Input contains control characters")]
    ControlCharacters,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("No credential received")]
    MissingCredential,

    #[error("Please enter an animal name")]
    EmptyPrompt,

    #[error("Please enter a valid animal name from the available list.")]
    UnknownAnimal(String),
}

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Checks a username on its own, before asking whether it is taken
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username.chars().all(is_valid_input_char) {
        return Err(ValidationError::ControlCharacters);
    }
    Ok(())
}

/// Checks for the login form. Password length is the server's business here;
/// accounts created before the minimum existed must still be able to log in.
pub fn validate_login(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    validate_username(username)?;
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    if !password.chars().all(is_valid_input_char) {
        return Err(ValidationError::ControlCharacters);
    }
    Ok(())
}

/// Checks for the signup form
pub fn validate_signup(username: &str, password: &str, confirm: &str) -> Result<(), ValidationError> {
    validate_login(username, password)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Normalize a prompt and check it names a known animal.
pub fn normalize_prompt(prompt: &str) -> Result<String, ValidationError> {
    let normalized = prompt.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    if !AVAILABLE_ANIMALS.contains(&normalized.as_str()) {
        return Err(ValidationError::UnknownAnimal(normalized));
    }
    Ok(normalized)
}

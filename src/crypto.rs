use rand::Rng;

/// Default token length in characters.
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

/// Generates a random alphanumeric token of the given length.
///
/// Tokens are stored verbatim; the auth service compares them by equality.
pub fn generate_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect()
}

/// Generates a token with the default length (32 characters).
pub fn generate_token_default() -> String {
    generate_token(DEFAULT_TOKEN_LENGTH)
}

/// Generates an identifier for records in stores that do not assign their own.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

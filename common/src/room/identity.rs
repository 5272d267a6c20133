use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub const INVITE_CODE_LEN: usize = 6;

// No 0/O or 1/I, so codes survive being read aloud
const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const ADJECTIVES: [&str; 12] = [
    "Swift", "Quiet", "Brave", "Clever", "Lucky", "Patient", "Bold", "Gentle", "Sly", "Calm",
    "Nimble", "Stubborn",
];

const ANIMALS: [&str; 12] = [
    "Otter", "Crane", "Tiger", "Heron", "Badger", "Panda", "Fox", "Turtle", "Koi", "Magpie",
    "Lynx", "Tortoise",
];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        SessionId(id.into())
    }

    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().as_simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InviteCodeError {
    #[error("Room code is empty")]
    Empty,
    #[error("Room code {0:?} may only contain letters and digits")]
    InvalidCharacter(String),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct InviteCode(String);

impl InviteCode {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..INVITE_CODE_LEN)
            .map(|_| INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())] as char)
            .collect();
        InviteCode(code)
    }

    // Accepts whatever a person typed: surrounding spaces and lower case are fine
    pub fn parse(input: &str) -> Result<Self, InviteCodeError> {
        let code = input.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(InviteCodeError::Empty);
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InviteCodeError::InvalidCharacter(code));
        }
        Ok(InviteCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InviteCode {
    type Error = InviteCodeError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        InviteCode::parse(&value)
    }
}

impl From<InviteCode> for String {
    fn from(code: InviteCode) -> Self {
        code.0
    }
}

impl fmt::Display for InviteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn generate_nickname<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Anonymous");
    let animal = ANIMALS.choose(rng).copied().unwrap_or("Player");
    format!("{} {}", adjective, animal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_code_is_parseable() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let code = InviteCode::generate(&mut rng);
            assert_eq!(code.as_str().len(), INVITE_CODE_LEN);
            assert_eq!(InviteCode::parse(code.as_str()), Ok(code.clone()));
            assert!(!code.as_str().contains('0'));
            assert!(!code.as_str().contains('O'));
        }
    }

    #[test]
    fn test_parse_normalises_input() {
        let code = InviteCode::parse("  ab3k9z ").unwrap();
        assert_eq!(code.as_str(), "AB3K9Z");
        assert_eq!(InviteCode::parse("   "), Err(InviteCodeError::Empty));
        assert!(matches!(
            InviteCode::parse("AB-12"),
            Err(InviteCodeError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn test_invite_code_validated_on_deserialize() {
        let code: InviteCode = serde_json::from_str("\"xyz234\"").unwrap();
        assert_eq!(code.as_str(), "XYZ234");
        assert!(serde_json::from_str::<InviteCode>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"XYZ234\"");
    }

    #[test]
    fn test_nickname_is_two_words() {
        let mut rng = StdRng::seed_from_u64(42);
        let name = generate_nickname(&mut rng);
        assert_eq!(name.split(' ').count(), 2);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(!a.is_blank());
        assert!(SessionId::new(" ").is_blank());
    }
}

use sha3::{Digest, Sha3_256};
use uuid::Uuid;

pub fn get_sha3_256_hash(data: &str) -> String {
    let mut hasher = Sha3_256::default();
    hasher.update(data);
    format!("{:X}", hasher.finalize())
}

/// Password hash salted with the owner's id.
pub fn hash_password(user_id: &Uuid, pwd: &str) -> String {
    get_sha3_256_hash(&format!("{user_id}:{pwd}"))
}

pub fn verify_password(user_id: &Uuid, pwd: &str, pwd_hash: &str) -> bool {
    hash_password(user_id, pwd) == pwd_hash
}

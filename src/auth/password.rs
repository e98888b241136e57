use super::AuthError;

/// bcrypt hashing, run on the blocking pool so request workers are not stalled.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: String) -> Result<String, AuthError> {
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// A malformed stored hash counts as a mismatch.
    pub async fn verify(&self, password: String, hashed: String) -> Result<bool, AuthError> {
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(verified.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_verifies_only_the_original_password() {
        let hasher = PasswordHasher::new(4);
        let hashed = hasher.hash("correct horse".to_string()).await.unwrap();

        assert_ne!(hashed, "correct horse");
        assert!(hasher.verify("correct horse".to_string(), hashed.clone()).await.unwrap());
        assert!(!hasher.verify("battery staple".to_string(), hashed).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_does_not_verify() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("pw".to_string(), "not-a-hash".to_string()).await.unwrap());
    }
}

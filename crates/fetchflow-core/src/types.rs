//! Domain types shared by every fetchflow crate
//!
//! - `User` / `Product` - records served by the remote data source
//! - `CombinedData` - result of the parallel users + products fetch

use serde::{Deserialize, Serialize};

/// A user record served by the remote data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(id: u32, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Case-insensitive substring match on name or email.
    ///
    /// A blank query matches every user.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.email.to_lowercase().contains(&needle)
    }
}

/// A product record served by the remote data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: f64,
}

impl Product {
    pub fn new(id: u32, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }
}

/// Users and products fetched concurrently, with the wall-clock time of the
/// combined operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedData {
    pub users: Vec<User>,
    pub products: Vec<Product>,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> User {
        User::new(1, "Ana García", "ana@email.com")
    }

    #[test]
    fn test_user_matches_name_case_insensitive() {
        assert!(ana().matches("GARC"));
        assert!(ana().matches("ana"));
    }

    #[test]
    fn test_user_matches_email() {
        assert!(ana().matches("@email.com"));
    }

    #[test]
    fn test_user_blank_query_matches() {
        assert!(ana().matches(""));
        assert!(ana().matches("   "));
    }

    #[test]
    fn test_user_no_match() {
        assert!(!ana().matches("pedro"));
    }

    #[test]
    fn test_combined_data_serializes_elapsed() {
        let data = CombinedData {
            users: vec![ana()],
            products: vec![Product::new(2, "Mouse Logitech", 29.99)],
            elapsed_ms: 1500,
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"elapsed_ms\":1500"));
    }
}

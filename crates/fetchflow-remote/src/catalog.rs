//! Fixed records served by the simulated backend

use fetchflow_core::{Product, User};

/// The five users every endpoint returns on success
pub fn sample_users() -> Vec<User> {
    vec![
        User::new(1, "Ana García", "ana@email.com"),
        User::new(2, "Carlos López", "carlos@email.com"),
        User::new(3, "María Fernández", "maria@email.com"),
        User::new(4, "Pedro Martínez", "pedro@email.com"),
        User::new(5, "Laura Sánchez", "laura@email.com"),
    ]
}

/// The five products the products endpoint returns on success
pub fn sample_products() -> Vec<Product> {
    vec![
        Product::new(1, "Laptop HP", 899.99),
        Product::new(2, "Mouse Logitech", 29.99),
        Product::new(3, "Mechanical Keyboard", 79.99),
        Product::new(4, "Monitor 27\"", 349.99),
        Product::new(5, "Webcam HD", 59.99),
    ]
}

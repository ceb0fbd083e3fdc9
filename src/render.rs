//! Plain-text rendering of UI states

use std::fmt::Write;

use fetchflow_app::{UiData, UiState};
use fetchflow_core::{CombinedData, Product, User};

/// Text shown for `state`
pub fn render(state: &UiState) -> String {
    match state {
        UiState::Idle => "Select an operation to try".to_string(),
        UiState::Loading => "⏳ Loading...".to_string(),
        UiState::LoadingWithMessage(message) => format!("⏳ {}", message),
        UiState::Success(UiData::Users(users)) => render_users(users),
        UiState::Success(UiData::Products(products)) => render_products(products),
        UiState::Success(UiData::Combined(data)) => render_combined(data),
        UiState::Error(message) => format!("❌ {}", message),
    }
}

fn render_users(users: &[User]) -> String {
    let mut out = format!("✅ {} users loaded:\n", users.len());
    for user in users {
        let _ = write!(out, "\n👤 {}\n   📧 {}", user.name, user.email);
    }
    out
}

fn render_products(products: &[Product]) -> String {
    let mut out = format!("✅ {} products loaded:\n", products.len());
    for product in products {
        let _ = write!(out, "\n📦 {} - ${:.2}", product.name, product.price);
    }
    out
}

fn render_combined(data: &CombinedData) -> String {
    let mut out = format!("✅ Parallel load completed in {}ms\n", data.elapsed_ms);
    let _ = write!(out, "\n👥 USERS ({}):", data.users.len());
    for user in &data.users {
        let _ = write!(out, "\n   • {}", user.name);
    }
    let _ = write!(out, "\n\n📦 PRODUCTS ({}):", data.products.len());
    for product in &data.products {
        let _ = write!(out, "\n   • {} - ${:.2}", product.name, product.price);
    }
    out
}

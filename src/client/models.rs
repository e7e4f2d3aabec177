use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// One component of a drink recipe. The public menu omits ingredient names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    /// Total number of parts across the whole recipe.
    pub fn total_parts(&self) -> u32 {
        self.recipe.iter().map(|ingredient| ingredient.parts).sum()
    }
}

impl Display for Drink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} ({} parts)", self.id, self.title, self.total_parts())?;

        for ingredient in &self.recipe {
            let name = ingredient.name.as_deref().unwrap_or("?");
            write!(f, "\n  {} x {name} ({})", ingredient.parts, ingredient.color)?;
        }

        Ok(())
    }
}

/// Body of `POST /drinks` and `PATCH /drinks/<id>`. Absent fields are left out.
#[derive(Debug, Default, Serialize)]
pub struct DrinkBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<&'a [Ingredient]>,
}

#[derive(Debug, Deserialize)]
pub struct DrinksResponse {
    pub success: bool,
    pub drinks: Vec<Drink>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub delete: i64,
}

/// The shapes the backend uses to report a failure.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorResponse {
    /// `{"success": false, "error": 404, "message": "resource not found"}`
    Api { error: u16, message: String },
    /// Raised by the permission check: `{"code": "token_expired", "description": "..."}`
    Auth { code: String, description: String },
}

impl Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api { error, message } => write!(f, "{message} ({error})"),
            Self::Auth { code, description } => write!(f, "{code}: {description}"),
        }
    }
}

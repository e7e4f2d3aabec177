mod methods;
mod models;

pub use methods::*;
pub use models::*;

use crate::{app_config::AppConfig, auth::Session, error::CoffeeShopError};
use reqwest::{blocking::Client, StatusCode};
use std::time::Duration;
use tracing::info;

pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
pub const POST_DRINKS: &str = "post:drinks";
pub const PATCH_DRINKS: &str = "patch:drinks";
pub const DELETE_DRINKS: &str = "delete:drinks";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[allow(clippy::module_name_repetitions)]
pub struct DrinksClient<'a> {
    config: &'a AppConfig,
    client: Client,
}

impl<'a> DrinksClient<'a> {
    pub fn new(config: &'a AppConfig) -> Result<Self, CoffeeShopError> {
        let client = Client::builder()
            .gzip(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { config, client })
    }

    /// The public menu. Ingredient names are not included.
    pub fn drinks(&self) -> Result<Vec<Drink>, CoffeeShopError> {
        info!("Fetching drinks from {}", self.config.api_server_url);
        let request = drinks_request(self.get_http_client(), &self.config.api_server_url)?;
        into_drinks(send(request)?)
    }

    /// The full menu with recipes. Requires `get:drinks-detail`.
    pub fn drinks_detail(&self, session: &Session) -> Result<Vec<Drink>, CoffeeShopError> {
        session.require(GET_DRINKS_DETAIL)?;
        info!("Fetching drink details");
        let request = drinks_detail_request(
            self.get_http_client(),
            &self.config.api_server_url,
            session.access_token(),
        )?;
        into_drinks(send(request)?)
    }

    pub fn create_drink(
        &self,
        session: &Session,
        title: &str,
        recipe: &[Ingredient],
    ) -> Result<Drink, CoffeeShopError> {
        session.require(POST_DRINKS)?;
        info!("Creating drink '{title}'");
        let body = DrinkBody {
            title: Some(title),
            recipe: Some(recipe),
        };
        let request = create_drink_request(
            self.get_http_client(),
            &self.config.api_server_url,
            session.access_token(),
            &body,
        )?;
        single_drink(into_drinks(send(request)?)?)
    }

    pub fn update_drink(
        &self,
        session: &Session,
        id: i64,
        body: &DrinkBody,
    ) -> Result<Drink, CoffeeShopError> {
        session.require(PATCH_DRINKS)?;
        info!("Updating drink #{id}");
        let request = update_drink_request(
            self.get_http_client(),
            &self.config.api_server_url,
            session.access_token(),
            id,
            body,
        )?;
        single_drink(into_drinks(send(request)?)?)
    }

    /// Delete a drink, returning the id the backend confirmed.
    pub fn delete_drink(&self, session: &Session, id: i64) -> Result<i64, CoffeeShopError> {
        session.require(DELETE_DRINKS)?;
        info!("Deleting drink #{id}");
        let request = delete_drink_request(
            self.get_http_client(),
            &self.config.api_server_url,
            session.access_token(),
            id,
        )?;
        into_deleted_id(send(request)?)
    }

    /// Return a reference to the underlying HTTP Client
    pub fn get_http_client(&self) -> &Client {
        &self.client
    }
}

fn single_drink(drinks: Vec<Drink>) -> Result<Drink, CoffeeShopError> {
    drinks
        .into_iter()
        .next()
        .ok_or_else(|| CoffeeShopError::ApiError {
            status: StatusCode::OK,
            message: "response did not include the drink".into(),
        })
}

//! Order execution for Polymarket CLOB.

use std::str::FromStr;
use std::sync::Arc;

use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use polymarket_client_sdk::auth::state::Authenticated;
use polymarket_client_sdk::auth::{Normal, Signer};
use polymarket_client_sdk::clob::types::response::PostOrderResponse;
use polymarket_client_sdk::clob::types::Side;
use polymarket_client_sdk::clob::{Client, Config as ClobConfig};
use polymarket_client_sdk::types::U256;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::Config;
use crate::error::{ConfigError, ExecutionError, Result};
use crate::exchange::{Fill, OrderExecutor, OrderId, OrderRequest, OrderSide};

/// Type alias for the authenticated CLOB client.
type AuthenticatedClient = Client<Authenticated<Normal>>;

/// Submits orders to the Polymarket CLOB.
pub struct Executor {
    /// The authenticated CLOB client.
    client: Arc<AuthenticatedClient>,
    /// The signer for signing orders.
    signer: Arc<PrivateKeySigner>,
}

impl Executor {
    /// Create a new executor by authenticating with the Polymarket CLOB.
    pub async fn new(config: &Config) -> Result<Self> {
        let private_key = config
            .wallet
            .private_key
            .as_ref()
            .ok_or(ConfigError::MissingField {
                field: "WALLET_PRIVATE_KEY",
            })?;

        let chain_id = config.polymarket.chain_id;

        let signer = PrivateKeySigner::from_str(private_key)
            .map_err(|e| ConfigError::InvalidValue {
                field: "WALLET_PRIVATE_KEY",
                reason: e.to_string(),
            })?
            .with_chain_id(Some(chain_id));

        info!(
            chain_id = chain_id,
            address = %signer.address(),
            "Creating CLOB client"
        );

        let client = Client::new(&config.polymarket.api_url, ClobConfig::default())
            .map_err(|e| ExecutionError::AuthFailed(format!("Failed to create CLOB client: {e}")))?
            .authentication_builder(&signer)
            .authenticate()
            .await
            .map_err(|e| ExecutionError::AuthFailed(e.to_string()))?;

        info!("CLOB client authenticated successfully");

        Ok(Self {
            client: Arc::new(client),
            signer: Arc::new(signer),
        })
    }

    /// Build, sign, and submit a single limit order.
    async fn submit_order(
        &self,
        token_id: &str,
        side: Side,
        size: Decimal,
        price: Decimal,
    ) -> Result<PostOrderResponse> {
        let token_id_u256 = U256::from_str(token_id).map_err(|e| ExecutionError::InvalidTokenId {
            token_id: token_id.to_string(),
            reason: e.to_string(),
        })?;

        let order = self
            .client
            .limit_order()
            .token_id(token_id_u256)
            .side(side)
            .price(price)
            .size(size)
            .build()
            .await
            .map_err(|e| ExecutionError::OrderBuildFailed(e.to_string()))?;

        let signed_order = self
            .client
            .sign(self.signer.as_ref(), order)
            .await
            .map_err(|e| ExecutionError::SigningFailed(e.to_string()))?;

        let response = self
            .client
            .post_order(signed_order)
            .await
            .map_err(|e| ExecutionError::SubmissionFailed(e.to_string()))?;

        info!(
            order_id = %response.order_id,
            token_id = token_id,
            side = ?side,
            size = %size,
            price = %price,
            "Order submitted"
        );

        Ok(response)
    }
}

#[async_trait]
impl OrderExecutor for Executor {
    async fn execute(&self, request: &OrderRequest) -> Result<Fill> {
        let side = match request.side() {
            OrderSide::Buy => Side::Buy,
            OrderSide::Sell => Side::Sell,
        };

        let response = self
            .submit_order(request.token_id(), side, request.size(), request.price())
            .await?;

        Ok(Fill::new(
            OrderId::new(response.order_id),
            request.size(),
            request.price(),
        ))
    }
}

//! Currency normalization
//!
//! Sales and expenses store two amounts: the native amount, denominated in
//! the project's currency override (else the organization currency), and a
//! snapshot converted into the organization's base currency. The snapshot
//! is computed once at write time and never recomputed.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::exchange::ExchangeRateClient;

/// Currency normalization service
#[derive(Clone)]
pub struct CurrencyService {
    exchange: ExchangeRateClient,
}

impl CurrencyService {
    /// Create a new CurrencyService instance
    pub fn new(exchange: ExchangeRateClient) -> Self {
        Self { exchange }
    }

    /// Convert a native amount into the organization's base currency.
    ///
    /// Falls back to the unconverted amount when the organization has no
    /// currency configured, the currencies already match, or the rate
    /// lookup fails. Database errors still propagate so the surrounding
    /// transaction aborts.
    pub async fn amount_in_org_currency(
        &self,
        conn: &mut PgConnection,
        organization_id: Uuid,
        project_id: Option<Uuid>,
        amount: Decimal,
    ) -> AppResult<Decimal> {
        let org_currency = sqlx::query_scalar::<_, Option<String>>(
            "SELECT currency_code FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?
        .flatten();

        let Some(org_currency) = org_currency else {
            return Ok(amount);
        };

        let project_currency = match project_id {
            Some(project_id) => sqlx::query_scalar::<_, Option<String>>(
                "SELECT currency_code FROM projects WHERE id = $1 AND organization_id = $2",
            )
            .bind(project_id)
            .bind(organization_id)
            .fetch_optional(&mut *conn)
            .await?
            .flatten(),
            None => None,
        };

        let native = shared::currency::native_currency(project_currency.as_deref(), &org_currency);
        if !shared::currency::needs_conversion(native, &org_currency) {
            return Ok(amount);
        }

        match self.exchange.get_rate(native, &org_currency).await {
            Ok(rate) => Ok(shared::currency::convert(amount, rate)),
            Err(err) => {
                tracing::warn!(
                    "Currency conversion {}->{} failed, storing native amount: {}",
                    native,
                    org_currency,
                    err
                );
                Ok(amount)
            }
        }
    }
}

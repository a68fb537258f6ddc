//! API Routes
//!
//! HTTP endpoint definitions. The gateway acts as the execution host:
//! it stamps timestamps, converts major-unit amounts and hands each
//! request to the ledger facade as one unit of work.

use axum::{
    extract::{Extension, FromRequest, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Account, AccountAttributes, AccountStatus, Amount, LedgerError, OperationContext,
    Transaction, TransactionType, TransferView,
};
use crate::error::{AppError, AppResult};
use crate::handlers::{
    CreateAccountCommand, DepositCommand, LedgerFacade, MovementResult, TransferCommand,
    TransferResult, WithdrawCommand,
};

/// JSON body extractor whose rejections use the `ErrorResponse` shape
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

// =========================================================================
// Application state
// =========================================================================

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerFacade,
    /// Fractional digits used to convert major-unit amounts
    pub currency_scale: u32,
}

impl AppState {
    pub fn new(ledger: LedgerFacade, currency_scale: u32) -> Self {
        Self {
            ledger,
            currency_scale,
        }
    }

    fn parse_amount(&self, amount: &str) -> AppResult<Amount> {
        Amount::parse_major_units(amount, self.currency_scale)
            .map_err(|e| AppError::Ledger(LedgerError::from(e)))
    }

    /// Opening balances may be zero, unlike movement amounts
    fn parse_opening_balance(&self, amount: Option<&str>) -> AppResult<u64> {
        match amount.map(str::trim) {
            None => Ok(0),
            Some(s) if s.parse::<Decimal>().map(|d| d.is_zero()).unwrap_or(false) => Ok(0),
            Some(s) => Ok(self.parse_amount(s)?.minor_units()),
        }
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub account_id: String,
    #[serde(default)]
    pub attributes: AccountAttributes,
    /// Major units, e.g. `"10.50"`
    #[serde(default)]
    pub opening_balance: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body of a deposit or withdrawal
#[derive(Debug, Serialize, Deserialize)]
pub struct MovementRequest {
    /// Major units, e.g. `"10.50"`
    pub amount: String,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender_id: String,
    pub receiver_id: String,
    /// Major units, e.g. `"10.50"`
    pub amount: String,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub account_id: String,
    pub balance: Decimal,
    pub balance_minor: u64,
    pub status: AccountStatus,
    pub attributes: AccountAttributes,
    pub created_at: DateTime<Utc>,
}

impl AccountResponse {
    fn new(account: &Account, scale: u32) -> Self {
        Self {
            account_id: account.id().to_string(),
            balance: account.balance().to_major_units(scale),
            balance_minor: account.balance().minor_units(),
            status: account.status(),
            attributes: account.attributes().clone(),
            created_at: account.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub account_id: String,
    pub reference_number: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub amount_minor: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_id: Option<String>,
}

impl TransactionResponse {
    fn new(transaction: Transaction, scale: u32) -> Self {
        Self {
            amount: transaction.amount.to_major_units(scale),
            amount_minor: transaction.amount.minor_units(),
            account_id: transaction.account_id,
            reference_number: transaction.reference_number,
            transaction_type: transaction.transaction_type,
            timestamp: transaction.timestamp,
            counterparty_id: transaction.counterparty_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub account: AccountResponse,
    pub transaction: TransactionResponse,
}

impl MovementResponse {
    fn new(result: MovementResult, scale: u32) -> Self {
        Self {
            account: AccountResponse::new(&result.account, scale),
            transaction: TransactionResponse::new(result.transaction, scale),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub reference_number: String,
    pub sender: AccountResponse,
    pub receiver: AccountResponse,
    pub debit: TransactionResponse,
    pub credit: TransactionResponse,
}

impl TransferResponse {
    fn new(result: TransferResult, scale: u32) -> Self {
        Self {
            reference_number: result.debit.reference_number.clone(),
            sender: AccountResponse::new(&result.sender, scale),
            receiver: AccountResponse::new(&result.receiver, scale),
            debit: TransactionResponse::new(result.debit, scale),
            credit: TransactionResponse::new(result.credit, scale),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferDetailResponse {
    pub sender_id: String,
    pub receiver_id: String,
    pub reference_number: String,
    pub amount: Decimal,
    pub amount_minor: u64,
    pub timestamp: DateTime<Utc>,
}

impl TransferDetailResponse {
    fn new(view: TransferView, scale: u32) -> Self {
        Self {
            amount: view.amount.to_major_units(scale),
            amount_minor: view.amount.minor_units(),
            sender_id: view.sender_id,
            receiver_id: view.receiver_id,
            reference_number: view.reference_number,
            timestamp: view.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountsListResponse {
    pub accounts: Vec<AccountResponse>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsListResponse {
    pub transactions: Vec<TransactionResponse>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/accounts", post(create_account).get(list_accounts))
        .route("/accounts/:account_id", get(get_account).delete(delete_account))
        .route("/accounts/:account_id/suspend", post(suspend_account))
        .route("/accounts/:account_id/reactivate", post(reactivate_account))
        .route("/accounts/:account_id/close", post(close_account))
        // Balance movements
        .route("/accounts/:account_id/deposit", post(deposit))
        .route("/accounts/:account_id/withdraw", post(withdraw))
        // Transactions
        .route("/accounts/:account_id/transactions", get(list_transactions))
        .route(
            "/accounts/:account_id/transactions/:reference_number",
            get(get_transaction),
        )
        .route("/transactions", get(list_all_transactions))
        // Transfers
        .route("/transfers", post(transfer))
        .route(
            "/transfers/:sender_id/:receiver_id/:reference_number",
            get(get_transfer),
        )
}

// =========================================================================
// Accounts
// =========================================================================

/// POST /accounts
async fn create_account(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let opening_balance = state.parse_opening_balance(request.opening_balance.as_deref())?;

    let mut command =
        CreateAccountCommand::new(request.account_id, request.timestamp.unwrap_or_else(Utc::now))
            .with_attributes(request.attributes)
            .with_opening_balance(opening_balance);
    if let Some(reference_number) = request.reference_number {
        command = command.with_reference_number(reference_number);
    }

    let account = state.ledger.create_account(command, &context).await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse::new(&account, state.currency_scale)),
    ))
}

/// GET /accounts
async fn list_accounts(State(state): State<AppState>) -> AppResult<Json<AccountsListResponse>> {
    let accounts = state.ledger.list_accounts().await?;

    Ok(Json(AccountsListResponse {
        accounts: accounts
            .iter()
            .map(|a| AccountResponse::new(a, state.currency_scale))
            .collect(),
    }))
}

/// GET /accounts/:account_id
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.ledger.get_account(&account_id).await?;
    Ok(Json(AccountResponse::new(&account, state.currency_scale)))
}

/// DELETE /accounts/:account_id
async fn delete_account(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<String>,
) -> AppResult<StatusCode> {
    state.ledger.delete_account(&account_id, &context).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /accounts/:account_id/suspend
async fn suspend_account(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<String>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.ledger.suspend_account(&account_id, &context).await?;
    Ok(Json(AccountResponse::new(&account, state.currency_scale)))
}

/// POST /accounts/:account_id/reactivate
async fn reactivate_account(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<String>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.ledger.reactivate_account(&account_id, &context).await?;
    Ok(Json(AccountResponse::new(&account, state.currency_scale)))
}

/// POST /accounts/:account_id/close
async fn close_account(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<String>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.ledger.close_account(&account_id, &context).await?;
    Ok(Json(AccountResponse::new(&account, state.currency_scale)))
}

// =========================================================================
// Balance movements
// =========================================================================

/// POST /accounts/:account_id/deposit
async fn deposit(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<String>,
    ApiJson(request): ApiJson<MovementRequest>,
) -> AppResult<Json<MovementResponse>> {
    let amount = state.parse_amount(&request.amount)?;

    let mut command = DepositCommand::new(
        account_id,
        amount.minor_units(),
        request.timestamp.unwrap_or_else(Utc::now),
    );
    if let Some(reference_number) = request.reference_number {
        command = command.with_reference_number(reference_number);
    }

    let result = state.ledger.deposit(command, &context).await?;
    Ok(Json(MovementResponse::new(result, state.currency_scale)))
}

/// POST /accounts/:account_id/withdraw
async fn withdraw(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<String>,
    ApiJson(request): ApiJson<MovementRequest>,
) -> AppResult<Json<MovementResponse>> {
    let amount = state.parse_amount(&request.amount)?;

    let mut command = WithdrawCommand::new(
        account_id,
        amount.minor_units(),
        request.timestamp.unwrap_or_else(Utc::now),
    );
    if let Some(reference_number) = request.reference_number {
        command = command.with_reference_number(reference_number);
    }

    let result = state.ledger.withdraw(command, &context).await?;
    Ok(Json(MovementResponse::new(result, state.currency_scale)))
}

// =========================================================================
// Transactions
// =========================================================================

/// GET /accounts/:account_id/transactions
async fn list_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> AppResult<Json<TransactionsListResponse>> {
    let transactions = state.ledger.list_transactions(&account_id).await?;
    Ok(Json(to_list(transactions, state.currency_scale)))
}

/// GET /accounts/:account_id/transactions/:reference_number
async fn get_transaction(
    State(state): State<AppState>,
    Path((account_id, reference_number)): Path<(String, String)>,
) -> AppResult<Json<TransactionResponse>> {
    let transaction = state
        .ledger
        .get_transaction(&account_id, &reference_number)
        .await?;
    Ok(Json(TransactionResponse::new(transaction, state.currency_scale)))
}

/// GET /transactions
async fn list_all_transactions(
    State(state): State<AppState>,
) -> AppResult<Json<TransactionsListResponse>> {
    let transactions = state.ledger.list_all_transactions().await?;
    Ok(Json(to_list(transactions, state.currency_scale)))
}

fn to_list(transactions: Vec<Transaction>, scale: u32) -> TransactionsListResponse {
    TransactionsListResponse {
        transactions: transactions
            .into_iter()
            .map(|t| TransactionResponse::new(t, scale))
            .collect(),
    }
}

// =========================================================================
// Transfers
// =========================================================================

/// POST /transfers
async fn transfer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<TransferRequest>,
) -> AppResult<Json<TransferResponse>> {
    let amount = state.parse_amount(&request.amount)?;

    let mut command = TransferCommand::new(
        request.sender_id,
        request.receiver_id,
        amount.minor_units(),
        request.timestamp.unwrap_or_else(Utc::now),
    );
    if let Some(reference_number) = request.reference_number {
        command = command.with_reference_number(reference_number);
    }

    let result = state.ledger.transfer(command, &context).await?;
    Ok(Json(TransferResponse::new(result, state.currency_scale)))
}

/// GET /transfers/:sender_id/:receiver_id/:reference_number
async fn get_transfer(
    State(state): State<AppState>,
    Path((sender_id, receiver_id, reference_number)): Path<(String, String, String)>,
) -> AppResult<Json<TransferDetailResponse>> {
    let view = state
        .ledger
        .get_transfer(&sender_id, &receiver_id, &reference_number)
        .await?;
    Ok(Json(TransferDetailResponse::new(view, state.currency_scale)))
}

//! Integration test for the standard worker wiring.

use chrono::Utc;
use common::AggregateId;
use domain::merchant::DepositSource;
use domain::{
    EstateId, EstateService, MerchantId, MerchantService, Money, TransactionService,
    TransactionType,
};
use event_store::InMemoryEventStore;
use projections::MerchantBalanceRepository;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;
use worker::Config;

#[tokio::test]
async fn standard_wiring_processes_the_full_flow() {
    let store = InMemoryEventStore::new();
    let (worker, _dispatcher, query_side) =
        worker::build_worker(store.clone(), &Config::default()).unwrap();

    let estate_id = EstateId::new();
    let merchant_id = MerchantId::new();

    let estates = EstateService::new(store.clone());
    let merchants = MerchantService::new(store.clone());
    let transactions = TransactionService::new(store.clone());

    estates
        .create_estate(estate_id, "Demo Estate".to_string())
        .await
        .unwrap();
    merchants
        .create_merchant(estate_id, merchant_id, "Corner Store".to_string())
        .await
        .unwrap();
    merchants
        .make_deposit(
            merchant_id,
            DepositSource::Manual,
            "BANK-REF-1".to_string(),
            Money::new(dec!(100.00)),
            Utc::now(),
        )
        .await
        .unwrap();

    // A logon transaction: authorised without product details
    let transaction_id = AggregateId::new();
    transactions
        .start_transaction(
            transaction_id,
            estate_id,
            merchant_id,
            TransactionType::Logon,
            "0001".to_string(),
            "device-1".to_string(),
            None,
        )
        .await
        .unwrap();
    transactions
        .authorise_transaction(
            transaction_id,
            "ABCD".to_string(),
            "0000".to_string(),
            "SUCCESS".to_string(),
        )
        .await
        .unwrap();
    transactions
        .complete_transaction(transaction_id)
        .await
        .unwrap();

    worker.drain().await.unwrap();

    let state = query_side
        .balances
        .load(estate_id, merchant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.balance, Money::new(dec!(100.00)));
    assert_eq!(state.deposit_count, 1);
    // Logon completion carries no amount; sale counter still advances the
    // authorised path with a zero movement
    assert_eq!(state.sale_count, 1);

    let merchant_row = query_side.read_model.merchant(merchant_id).await.unwrap();
    assert_eq!(merchant_row.merchant_name, "Corner Store");

    let row = query_side
        .read_model
        .transaction(transaction_id)
        .await
        .unwrap();
    assert_eq!(row.is_authorised, Some(true));
}

#[tokio::test]
async fn worker_run_shuts_down_on_cancellation() {
    let store = InMemoryEventStore::new();
    let (worker, _dispatcher, _query_side) =
        worker::build_worker(store, &Config::default()).unwrap();

    let shutdown = CancellationToken::new();
    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { worker.run(shutdown).await })
    };

    shutdown.cancel();
    handle.await.unwrap();
}

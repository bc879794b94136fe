use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CalculationType, FeeId, FeeToCalculate, FeeType, Money, calculate_fees};
use rust_decimal::Decimal;

fn fee_schedule(n: usize) -> Vec<FeeToCalculate> {
    (0..n)
        .map(|i| FeeToCalculate {
            fee_id: FeeId::new(),
            calculation_type: if i % 2 == 0 {
                CalculationType::Percentage
            } else {
                CalculationType::Fixed
            },
            fee_type: if i % 3 == 0 {
                FeeType::ServiceProvider
            } else {
                FeeType::Merchant
            },
            value: Decimal::new(i as i64 + 1, 2),
        })
        .collect()
}

fn bench_calculate_single_fee(c: &mut Criterion) {
    let fees = fee_schedule(1);
    let amount = Money::new(Decimal::new(10000, 2));

    c.bench_function("fees/calculate_single", |b| {
        b.iter(|| calculate_fees(&fees, amount));
    });
}

fn bench_calculate_fee_schedule_20(c: &mut Criterion) {
    let fees = fee_schedule(20);
    let amount = Money::new(Decimal::new(10000, 2));

    c.bench_function("fees/calculate_schedule_20", |b| {
        b.iter(|| calculate_fees(&fees, amount));
    });
}

criterion_group!(benches, bench_calculate_single_fee, bench_calculate_fee_schedule_20);
criterion_main!(benches);

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use reclaim_core::PostalAddress;
use reclaim_tax::{
    ExternalLineTax, ExternalTaxCalculator, ExternalTaxError, ExternalTaxRequest, ExternalTaxResponse,
    ExternalTaxResult, TaxCategory, TaxEngine, TaxRequest, TaxableLine,
};
use rust_decimal::Decimal;

/// Echoes a flat 8% per line, like a remote service with full coverage.
struct FlatRateExternal;

impl ExternalTaxCalculator for FlatRateExternal {
    fn calculate(&self, request: &ExternalTaxRequest) -> Result<ExternalTaxResponse, ExternalTaxError> {
        let rate = Decimal::new(8, 2);
        let per_line_tax = request
            .line_items
            .iter()
            .map(|l| ExternalLineTax {
                id: l.id.clone(),
                tax: (l.quantity * l.unit_price - l.discount) * rate,
            })
            .collect();
        Ok(ExternalTaxResponse::Calculated(ExternalTaxResult {
            per_line_tax,
            shipping_tax: request.shipping * rate,
            combined_rate: rate,
            has_nexus: true,
            taxable_amount: Decimal::ZERO,
            total_tax: Decimal::ZERO,
        }))
    }
}

fn order(country: &str, region: &str, line_count: usize) -> TaxRequest {
    let categories = [TaxCategory::TangibleGoods, TaxCategory::Labor, TaxCategory::DigitalGoods];
    TaxRequest {
        ship_to: PostalAddress {
            line1: "100 Industrial Pkwy".to_string(),
            city: "Hamilton".to_string(),
            region: region.to_string(),
            postal_code: "L8N 1A1".to_string(),
            country: country.to_string(),
            ..PostalAddress::default()
        },
        ship_from: None,
        customer_exempt: false,
        exemption_type: None,
        lines: (0..line_count)
            .map(|i| TaxableLine {
                line_ref: format!("line-{i}"),
                sku: format!("SKU-{i}"),
                quantity: Decimal::from(i as i64 + 1),
                unit_price: Decimal::new(1999 + i as i64, 2),
                discount: Decimal::new(i as i64 % 7, 0),
                category: categories[i % categories.len()].clone(),
                external_tax_code: None,
            })
            .collect(),
        shipping_amount: Decimal::new(4500, 2),
    }
}

fn bench_rule_based(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_based_breakdown");
    let engine = TaxEngine::new(FlatRateExternal);

    for line_count in [1usize, 10, 100, 500].iter() {
        group.throughput(Throughput::Elements(*line_count as u64));
        let request = order("CA", "QC", *line_count);
        group.bench_with_input(BenchmarkId::from_parameter(line_count), &request, |b, request| {
            b.iter(|| engine.compute(black_box(request)).unwrap());
        });
    }

    group.finish();
}

fn bench_delegated(c: &mut Criterion) {
    let mut group = c.benchmark_group("delegated_breakdown");
    let engine = TaxEngine::new(FlatRateExternal);

    for line_count in [1usize, 10, 100].iter() {
        group.throughput(Throughput::Elements(*line_count as u64));
        let request = order("US", "NY", *line_count);
        group.bench_with_input(BenchmarkId::from_parameter(line_count), &request, |b, request| {
            b.iter(|| engine.compute(black_box(request)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rule_based, bench_delegated);
criterion_main!(benches);

use crate::analysis::{DateSeries, PriceSeries};

/// Доходность следующего дня: для даты t это (p[t+1] - p[t]) / p[t].
/// Последняя дата не имеет преемника и отбрасывается.
pub fn compute_next_day_returns(prices: &PriceSeries) -> DateSeries {
    prices
        .points()
        .windows(2)
        .filter_map(|pair| {
            let (today, next) = (&pair[0], &pair[1]);
            let change = (next.price - today.price) / today.price;
            change.is_finite().then_some((today.date, change))
        })
        .collect()
}

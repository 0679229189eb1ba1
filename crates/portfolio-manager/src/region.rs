use analysis_core::{AnalysisError, PricedHolding, Region};
use std::collections::BTreeMap;

use crate::aggregation::group_sum;

/// Exchange fragments per region, checked in this order by substring.
/// Short fragments ("ne", "sto", "set") match more than their own exchange; the first
/// region listed wins.
const REGION_TABLE: [(Region, &[&str]); 4] = [
    (
        Region::American,
        &[
            "nasdaq", "nyse", "amex", "arca", "pcx", "nms", "nyq", "snp", "cboe", "bats", "tsx",
            "tsxv", "cse", "ne",
        ],
    ),
    (
        Region::European,
        &[
            "lse", "euronext", "xetra", "bme", "six", "fra", "ams", "par", "mil", "lis", "vse",
            "omx", "wse", "prague", "athens", "budapest", "bvx", "micex", "moex", "hel", "sto",
            "oslo", "dublin", "bolsa-madrid", "ger", "ebs",
        ],
    ),
    (
        Region::Asian,
        &[
            "tse", "sse", "hkex", "kospi", "kosdaq", "nse", "bse", "szse", "taiex", "jpxt", "hsi",
            "idx", "pse", "bursa-malaysia", "set", "hkg", "jpx", "tky", "sto", "shanghai",
            "shenzhen", "taipei", "karachi", "dhaka", "ksc", "nsi",
        ],
    ),
    (
        Region::OtherUnknown,
        &[
            "asx", "nzx", "jse", "bvc", "bmv", "b3", "bovespa", "safex", "adx", "dfm", "tadawul",
            "qse", "egx", "casablanca", "nairobi", "lagos", "muscat", "doha", "kuwait", "manama",
            "colombia", "peru", "chile", "argentina",
        ],
    ),
];

/// Region of a listing exchange code (e.g. "NMS", "PAR", "JPX")
pub fn classify_exchange(exchange: Option<&str>) -> Region {
    let exchange = exchange.unwrap_or("").to_lowercase();
    REGION_TABLE
        .iter()
        .find(|(_, fragments)| fragments.iter().any(|f| exchange.contains(f)))
        .map(|(region, _)| region.clone())
        .unwrap_or(Region::Unmatched(exchange))
}

/// Percent of invested value per region.
///
/// Holdings priced at zero or below are skipped. Fails with `ZeroDenominator` when
/// nothing is invested; otherwise the percentages sum to 100.
pub fn region_diversification<F>(
    holdings: &[PricedHolding],
    region_fn: F,
) -> Result<BTreeMap<Region, f64>, AnalysisError>
where
    F: Fn(&PricedHolding) -> Region,
{
    let invested: Vec<&PricedHolding> = holdings.iter().filter(|h| h.price > 0.0).collect();
    let total: f64 = invested.iter().map(|h| h.value).sum();
    if total == 0.0 {
        return Err(AnalysisError::ZeroDenominator(
            "total investment is zero, cannot calculate diversification".to_string(),
        ));
    }

    Ok(group_sum(&invested, |h| region_fn(h), |h| h.value / total * 100.0))
}

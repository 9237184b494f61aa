//! Standard metrics of reporting forms 0420158 and 0420162.

use crate::{Formula, MetricDefinition, MetricKind};
use inslens_data::ReportingForm::{Form158, Form162};

/// Averages are reported per thousand units.
const PER_THOUSAND: f64 = 1.0 / 1000.0;

/// All standard metric definitions, dependencies before dependents.
pub fn standard_definitions() -> Vec<MetricDefinition> {
    use MetricKind::{AverageValue, Quantity, Ratio, Value};
    let both = &[Form158, Form162];
    let f162 = &[Form162];

    vec![
        // Base metrics
        MetricDefinition::new("direct_premiums", Formula::Base, Value, f162, "Direct premiums"),
        MetricDefinition::new("direct_losses", Formula::Base, Value, f162, "Direct losses"),
        MetricDefinition::new("inward_premiums", Formula::Base, Value, f162, "Inward reinsurance premiums"),
        MetricDefinition::new("inward_losses", Formula::Base, Value, f162, "Inward reinsurance losses"),
        MetricDefinition::new("ceded_premiums", Formula::Base, Value, both, "Ceded premiums"),
        MetricDefinition::new("ceded_losses", Formula::Base, Value, both, "Ceded losses"),
        MetricDefinition::new("new_contracts", Formula::Base, Quantity, f162, "New contracts"),
        MetricDefinition::new("contracts_end", Formula::Base, Quantity, f162, "Contracts in force"),
        MetricDefinition::new("premiums_interm", Formula::Base, Value, f162, "Premiums via intermediaries"),
        MetricDefinition::new("commissions_interm", Formula::Base, Value, f162, "Intermediary commissions"),
        MetricDefinition::new("new_sums", Formula::Base, Value, f162, "New sums insured"),
        MetricDefinition::new("sums_end", Formula::Base, Value, f162, "Sums insured in force"),
        MetricDefinition::new("claims_reported", Formula::Base, Quantity, f162, "Claims reported"),
        MetricDefinition::new("claims_settled", Formula::Base, Quantity, f162, "Claims settled"),
        // Totals and results
        MetricDefinition::new(
            "total_premiums",
            Formula::add(&["direct_premiums", "inward_premiums"]),
            Value,
            both,
            "Total premiums",
        ),
        MetricDefinition::new(
            "total_losses",
            Formula::add(&["direct_losses", "inward_losses"]),
            Value,
            both,
            "Total losses",
        ),
        MetricDefinition::new(
            "net_premiums",
            Formula::sub("total_premiums", "ceded_premiums"),
            Value,
            both,
            "Net premiums",
        ),
        MetricDefinition::new(
            "net_losses",
            Formula::sub("total_losses", "ceded_losses"),
            Value,
            both,
            "Net losses",
        ),
        MetricDefinition::new(
            "net_result",
            Formula::sub("net_premiums", "net_losses"),
            Value,
            both,
            "Net underwriting result",
        ),
        MetricDefinition::new(
            "gross_result",
            Formula::sub("total_premiums", "total_losses"),
            Value,
            both,
            "Gross underwriting result",
        ),
        // Averages
        MetricDefinition::new(
            "average_new_premium",
            Formula::div_scaled("direct_premiums", "new_contracts", PER_THOUSAND),
            AverageValue,
            f162,
            "Average premium per new contract",
        ),
        MetricDefinition::new(
            "average_loss",
            Formula::div_scaled("direct_losses", "claims_settled", PER_THOUSAND),
            AverageValue,
            f162,
            "Average loss per settled claim",
        ),
        MetricDefinition::new(
            "average_sum_insured",
            Formula::div_scaled("sums_end", "contracts_end", PER_THOUSAND),
            AverageValue,
            f162,
            "Average sum insured",
        ),
        MetricDefinition::new(
            "average_new_sum_insured",
            Formula::div_scaled("new_sums", "new_contracts", PER_THOUSAND),
            AverageValue,
            f162,
            "Average sum insured of new contracts",
        ),
        // Ratios
        MetricDefinition::new(
            "average_rate",
            Formula::div_scaled("direct_premiums", "new_sums", PER_THOUSAND),
            Ratio,
            f162,
            "Average rate",
        ),
        MetricDefinition::new(
            "ceded_premiums_ratio",
            Formula::div("ceded_premiums", "total_premiums"),
            Ratio,
            both,
            "Ceded share of premiums",
        ),
        MetricDefinition::new(
            "ceded_losses_ratio",
            Formula::div("ceded_losses", "total_losses"),
            Ratio,
            both,
            "Ceded share of losses",
        ),
        MetricDefinition::new(
            "premiums_interm_ratio",
            Formula::div("premiums_interm", "direct_premiums"),
            Ratio,
            f162,
            "Intermediated share of premiums",
        ),
        MetricDefinition::new(
            "commissions_rate",
            Formula::div("commissions_interm", "premiums_interm"),
            Ratio,
            f162,
            "Commission rate",
        ),
        MetricDefinition::new(
            "net_loss_ratio",
            Formula::div("net_losses", "net_premiums"),
            Ratio,
            both,
            "Net loss ratio",
        ),
        MetricDefinition::new(
            "gross_loss_ratio",
            Formula::div("total_losses", "total_premiums"),
            Ratio,
            both,
            "Gross loss ratio",
        ),
        MetricDefinition::new(
            "direct_loss_ratio",
            Formula::div("direct_losses", "direct_premiums"),
            Ratio,
            f162,
            "Direct loss ratio",
        ),
        MetricDefinition::new(
            "inward_loss_ratio",
            Formula::div("inward_losses", "inward_premiums"),
            Ratio,
            f162,
            "Inward reinsurance loss ratio",
        ),
        MetricDefinition::new(
            "ceded_losses_to_ceded_premiums_ratio",
            Formula::div("ceded_losses", "ceded_premiums"),
            Ratio,
            both,
            "Ceded losses to ceded premiums",
        ),
        MetricDefinition::new(
            "ceded_ratio_diff",
            Formula::sub("ceded_losses_ratio", "ceded_premiums_ratio"),
            Ratio,
            both,
            "Ceded losses share minus ceded premiums share",
        ),
        MetricDefinition::new(
            "effect_on_loss_ratio",
            Formula::sub("gross_loss_ratio", "net_loss_ratio"),
            Ratio,
            both,
            "Reinsurance effect on loss ratio",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_unique() {
        let defs = standard_definitions();
        let codes: HashSet<&str> = defs.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes.len(), defs.len());
        assert_eq!(defs.len(), 36);
    }

    #[test]
    fn test_base_metric_counts() {
        let defs = standard_definitions();
        let base162 = defs
            .iter()
            .filter(|d| d.is_base() && d.applies_to(Form162))
            .count();
        let base158 = defs
            .iter()
            .filter(|d| d.is_base() && d.applies_to(Form158))
            .count();
        assert_eq!(base162, 14);
        assert_eq!(base158, 2);
    }
}

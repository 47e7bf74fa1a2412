//! Flat issuer profile as reported by the market-data provider.

use serde::{Deserialize, Serialize};

/// Issuer attributes. Every field is optional and absent values are never
/// defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Full company name
    pub long_name: Option<String>,
    /// Short company name
    pub short_name: Option<String>,
    /// Sector
    pub sector: Option<String>,
    /// Industry
    pub industry: Option<String>,
    /// Business description
    pub long_business_summary: Option<String>,
    /// Company website
    pub website: Option<String>,
    /// Reporting currency
    pub currency: Option<String>,
    /// Market capitalization
    pub market_cap: Option<f64>,
    /// Shares outstanding
    pub shares_outstanding: Option<f64>,
    /// Trailing price to earnings
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    /// Forward price to earnings
    #[serde(rename = "forwardPE")]
    pub forward_pe: Option<f64>,
    /// Price to book
    pub price_to_book: Option<f64>,
    /// Trailing price to sales
    #[serde(rename = "priceToSalesTrailing12Months")]
    pub price_to_sales_trailing_12_months: Option<f64>,
    /// Enterprise value to EBITDA
    pub enterprise_to_ebitda: Option<f64>,
    /// Dividend yield as a fraction
    pub dividend_yield: Option<f64>,
    /// Beta
    pub beta: Option<f64>,
}

impl Profile {
    /// Preferred display name: long name, then short name.
    pub fn display_name(&self) -> Option<&str> {
        self.long_name.as_deref().or(self.short_name.as_deref())
    }

    /// Set a numeric attribute by provider key. Unknown keys and non-finite
    /// values are ignored; a key already set keeps its first value.
    pub fn set_number(&mut self, key: &str, value: f64) {
        if !value.is_finite() {
            return;
        }
        let slot = match key {
            "marketCap" => &mut self.market_cap,
            "sharesOutstanding" => &mut self.shares_outstanding,
            "trailingPE" => &mut self.trailing_pe,
            "forwardPE" => &mut self.forward_pe,
            "priceToBook" => &mut self.price_to_book,
            "priceToSalesTrailing12Months" => &mut self.price_to_sales_trailing_12_months,
            "enterpriseToEbitda" => &mut self.enterprise_to_ebitda,
            "dividendYield" => &mut self.dividend_yield,
            "beta" => &mut self.beta,
            _ => return,
        };
        slot.get_or_insert(value);
    }

    /// Set a text attribute by provider key. Unknown keys and blank values are
    /// ignored; a key already set keeps its first value.
    pub fn set_text(&mut self, key: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let slot = match key {
            "longName" => &mut self.long_name,
            "shortName" => &mut self.short_name,
            "sector" => &mut self.sector,
            "industry" => &mut self.industry,
            "longBusinessSummary" => &mut self.long_business_summary,
            "website" => &mut self.website,
            "currency" => &mut self.currency,
            _ => return,
        };
        slot.get_or_insert_with(|| value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_wins() {
        let mut profile = Profile::default();
        profile.set_number("marketCap", 1.5e9);
        profile.set_number("marketCap", 2.0e9);
        profile.set_number("beta", f64::NAN);
        profile.set_number("unknownKey", 3.0);
        assert_eq!(profile.market_cap, Some(1.5e9));
        assert_eq!(profile.beta, None);
    }

    #[test]
    fn test_display_name_falls_back_to_short_name() {
        let mut profile = Profile::default();
        assert_eq!(profile.display_name(), None);
        profile.set_text("shortName", "ROYAL BANK");
        profile.set_text("longName", "  ");
        assert_eq!(profile.display_name(), Some("ROYAL BANK"));
        profile.set_text("longName", "Royal Bank of Canada");
        assert_eq!(profile.display_name(), Some("Royal Bank of Canada"));
    }

    #[test]
    fn test_serde_uses_provider_keys() {
        let json = r#"{"trailingPE": 12.5, "priceToSalesTrailing12Months": 3.0, "longName": "Enbridge Inc."}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.trailing_pe, Some(12.5));
        assert_eq!(profile.price_to_sales_trailing_12_months, Some(3.0));
        assert_eq!(profile.long_name.as_deref(), Some("Enbridge Inc."));
        assert_eq!(profile.beta, None);
    }
}

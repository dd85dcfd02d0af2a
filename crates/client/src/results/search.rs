//! Auction search result mapping.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use super::{lenient_bool, lenient_f64, lenient_i64, lenient_str, ApiResult, ResultState};

/// A single auction listing from a search response.
#[derive(Debug, Clone, Default)]
pub struct SearchItem {
    pub auction_id: String,
    pub title: String,
    pub category_id: Option<i64>,
    pub seller_id: String,
    pub auction_url: String,
    pub image_url: String,
    pub current_price: Option<f64>,
    pub bid_count: Option<i64>,
    pub end_time: Option<DateTime<Utc>>,
    pub has_hidden_price: bool,
    pub buy_price: Option<f64>,
    pub is_charity: bool,
    pub is_offer: bool,
    pub charity_proportion: Option<i64>,
    pub is_adult: bool,
}

/// Result of a search call: paging attributes plus the listed items.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    state: ResultState,
    pub total_results_available: Option<i64>,
    pub total_results_returned: Option<i64>,
    pub first_result_position: Option<i64>,
    /// The query terms the upstream actually searched for.
    pub words: String,
    pub items: Vec<SearchItem>,
}

impl ApiResult for SearchResult {
    fn state(&self) -> &ResultState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ResultState {
        &mut self.state
    }

    fn map_values(&mut self, payload: &Value) {
        let Some(result_set) = payload.get("ResultSet") else {
            return;
        };
        if let Some(attrs) = result_set.get("@attributes") {
            self.total_results_available = lenient_i64(attrs.get("totalResultsAvailable"));
            self.total_results_returned = lenient_i64(attrs.get("totalResultsReturned"));
            self.first_result_position = lenient_i64(attrs.get("firstResultPosition"));
        }
        let Some(result) = result_set.get("Result") else {
            return;
        };
        self.words = lenient_str(result.get("UnitsWord")).unwrap_or_default();
        if let Some(items) = result.get("Item").and_then(Value::as_array) {
            self.items = items.iter().map(map_item).collect();
        }
    }
}

/// The authenticated user's watch list. Same listing shape as search,
/// without the query echo.
#[derive(Debug, Clone, Default)]
pub struct WatchListResult {
    state: ResultState,
    pub total_results_available: Option<i64>,
    pub total_results_returned: Option<i64>,
    pub first_result_position: Option<i64>,
    pub items: Vec<SearchItem>,
}

impl ApiResult for WatchListResult {
    fn state(&self) -> &ResultState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ResultState {
        &mut self.state
    }

    fn map_values(&mut self, payload: &Value) {
        let Some(result_set) = payload.get("ResultSet") else {
            return;
        };
        if let Some(attrs) = result_set.get("@attributes") {
            self.total_results_available = lenient_i64(attrs.get("totalResultsAvailable"));
            self.total_results_returned = lenient_i64(attrs.get("totalResultsReturned"));
            self.first_result_position = lenient_i64(attrs.get("firstResultPosition"));
        }
        if let Some(items) = result_set
            .get("Result")
            .and_then(|r| r.get("Item"))
            .and_then(Value::as_array)
        {
            self.items = items.iter().map(map_item).collect();
        }
    }
}

fn map_item(item: &Value) -> SearchItem {
    let option = item.get("Option");
    SearchItem {
        auction_id: lenient_str(item.get("AuctionID")).unwrap_or_default(),
        title: lenient_str(item.get("Title")).unwrap_or_default(),
        category_id: lenient_i64(item.get("CategoryId")),
        seller_id: lenient_str(item.get("Seller").and_then(|s| s.get("Id"))).unwrap_or_default(),
        auction_url: lenient_str(item.get("AuctionItemUrl")).unwrap_or_default(),
        image_url: lenient_str(item.get("Image")).unwrap_or_default(),
        current_price: lenient_f64(item.get("CurrentPrice")),
        bid_count: lenient_i64(item.get("Bids")),
        end_time: lenient_str(item.get("EndTime")).as_deref().and_then(parse_end_time),
        has_hidden_price: item.get("HiddenPrice").is_some(),
        buy_price: lenient_f64(item.get("BidOrBuy")),
        is_charity: option.and_then(|o| o.get("CharityOptionIcon")).is_some(),
        is_offer: option.and_then(|o| o.get("OfferIcon")).is_some(),
        charity_proportion: lenient_i64(item.get("CharityOption").and_then(|c| c.get("Proportion"))),
        is_adult: lenient_bool(item.get("IsAdult")).unwrap_or(false),
    }
}

/// End times arrive as RFC 3339 or as a bare `YYYY-MM-DD HH:MM:SS` string.
fn parse_end_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "ResultSet": {
                "@attributes": {
                    "totalResultsAvailable": "120",
                    "totalResultsReturned": 2,
                    "firstResultPosition": 1
                },
                "Result": {
                    "UnitsWord": "vintage camera",
                    "Item": [
                        {
                            "AuctionID": "x100",
                            "Title": "Vintage rangefinder",
                            "CategoryId": "2084",
                            "Seller": {"Id": "seller1"},
                            "AuctionItemUrl": "https://auctions.test/x100",
                            "Image": "https://img.test/x100.jpg",
                            "CurrentPrice": "1500.0",
                            "Bids": 4,
                            "EndTime": "2026-09-01T12:00:00+09:00",
                            "BidOrBuy": "3000.0",
                            "IsAdult": "false"
                        },
                        {
                            "AuctionID": "x101",
                            "Title": "Lens cap",
                            "EndTime": "2026-09-02 08:30:00",
                            "HiddenPrice": "1"
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn maps_attributes_and_items() {
        let mut result = SearchResult::default();
        result.set(&sample_payload());
        assert!(result.is_success());
        assert_eq!(result.total_results_available, Some(120));
        assert_eq!(result.total_results_returned, Some(2));
        assert_eq!(result.words, "vintage camera");
        assert_eq!(result.items.len(), 2);

        let first = &result.items[0];
        assert_eq!(first.auction_id, "x100");
        assert_eq!(first.category_id, Some(2084));
        assert_eq!(first.seller_id, "seller1");
        assert_eq!(first.current_price, Some(1500.0));
        assert_eq!(first.bid_count, Some(4));
        assert_eq!(first.buy_price, Some(3000.0));
        assert!(!first.has_hidden_price);
        assert!(first.end_time.is_some());

        let second = &result.items[1];
        assert!(second.has_hidden_price);
        assert!(second.end_time.is_some());
    }

    #[test]
    fn empty_payload_maps_to_no_items() {
        let mut result = SearchResult::default();
        result.set(&json!({}));
        assert!(result.is_success());
        assert!(result.items.is_empty());
        assert_eq!(result.total_results_available, None);
    }

    #[test]
    fn end_time_parses_both_formats() {
        assert!(parse_end_time("2026-09-01T12:00:00Z").is_some());
        assert!(parse_end_time("2026-09-01 12:00:00").is_some());
        assert!(parse_end_time("tomorrow").is_none());
    }
}

//! Upstream error code table.
//!
//! The auction API reports failures as numeric codes inside an `Error`
//! envelope. Known codes map to human-readable messages here; unknown
//! codes fall back to the code itself.

/// Look up the message for a known upstream error code.
pub fn message_for_code(code: i64) -> Option<&'static str> {
    let message = match code {
        100 => "Required parameter is missing",
        101 => "Parameter value is too long",
        102 => "Invalid parameter value",
        103 => "Authentication credentials are missing",
        104 => "Authentication failed",
        105 => "Access token has expired",
        106 => "Access denied for this application",
        107 => "Rate limit exceeded",
        108 => "Requested resource was not found",
        109 => "Requested operation is not permitted",
        110 => "Service is temporarily unavailable",
        301 => "Auction has already ended",
        302 => "Auction was cancelled by the seller",
        303 => "Bid amount is below the current price",
        304 => "Bidder is blacklisted by the seller",
        305 => "Bidding on own auction is not allowed",
        401 => "Account is suspended",
        402 => "Account requires additional verification",
        21008 => "User consent is required to continue",
        _ => return None,
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_maps_to_message() {
        assert_eq!(message_for_code(104), Some("Authentication failed"));
        assert_eq!(message_for_code(21008), Some("User consent is required to continue"));
    }

    #[test]
    fn unknown_code_yields_none() {
        assert_eq!(message_for_code(99999), None);
    }
}

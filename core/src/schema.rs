//! Structural validation of order and waitlist payloads.
//!
//! Each schema walks its fields in declaration order and stops at the first
//! violated constraint, so the reported message is stable for a given input.
//! Validation is pure: no I/O, no shared state.
//!
//! | Schema    | Field order                                             |
//! |-----------|---------------------------------------------------------|
//! | Order     | `eventId`, `tickets[]` (`ticketId`, `quantity`), `userEmail`, `userName`, `paymentMethod` |
//! | Waitlist  | `eventId`, `ticketId`, `email`, `phone`                 |
//!
//! Optional fields may be omitted or `null`; a supplied string must still meet
//! the field's constraint. Unknown keys are ignored.

use crate::error::ValidationError;
use crate::types::{
    MAX_TICKETS_PER_TYPE, MIN_TICKETS_PER_TYPE, OrderRequest, PaymentMethod, TicketLineItem,
    WaitlistIntent,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

type Result<T> = std::result::Result<T, ValidationError>;
type Object = Map<String, Value>;

/// Longest accepted email address (RFC 5321 path limit).
const MAX_EMAIL_LEN: usize = 254;

/// Longest accepted local part of an email address.
const MAX_EMAIL_LOCAL_LEN: usize = 64;

/// Minimum length of a display name.
const MIN_NAME_LEN: usize = 2;

#[allow(clippy::expect_used)] // constant pattern
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    )
    .expect("email pattern compiles")
});

#[allow(clippy::expect_used)] // constant pattern
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{7,14}$").expect("phone pattern compiles"));

mod messages {
    pub const EVENT_ID_REQUIRED: &str = "Event ID is required";
    pub const EVENT_ID_TYPE: &str = "Event ID must be a string";
    pub const TICKETS_TYPE: &str = "Tickets must be a list";
    pub const TICKETS_EMPTY: &str = "At least one ticket is required";
    pub const TICKET_TYPE: &str = "Each ticket must be an object";
    pub const TICKET_ID_REQUIRED: &str = "Ticket ID is required";
    pub const TICKET_ID_TYPE: &str = "Ticket ID must be a string";
    pub const QUANTITY_TYPE: &str = "Quantity must be a number";
    pub const QUANTITY_WHOLE: &str = "Quantity must be a whole number";
    pub const QUANTITY_MIN: &str = "Quantity must be at least 1";
    pub const QUANTITY_MAX: &str = "Maximum 10 tickets per type";
    pub const EMAIL_INVALID: &str = "Invalid email address";
    pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
    pub const PAYMENT_METHOD_INVALID: &str = "Invalid payment method";
    pub const PHONE_INVALID: &str = "Invalid phone number";
}

/// Named request schemas, one per mutating endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    /// Ticket order creation
    Order,
    /// Waitlist registration
    WaitlistJoin,
}

impl Schema {
    /// Stable name used in logs and metrics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::WaitlistJoin => "waitlist_join",
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of [`validate`], tagged by schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated {
    /// Shape-valid order (business rules still pending)
    Order(OrderRequest),
    /// Verified waitlist registration
    Waitlist(WaitlistIntent),
}

/// Validate a raw body against the named schema.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidBody`] when the body is not a JSON
/// object, otherwise the first violated field constraint.
pub fn validate(schema: Schema, raw: &[u8]) -> Result<Validated> {
    match schema {
        Schema::Order => validate_order(raw).map(Validated::Order),
        Schema::WaitlistJoin => validate_waitlist(raw).map(Validated::Waitlist),
    }
}

/// Validate an order payload.
///
/// # Errors
///
/// Returns the first violated constraint in field-declaration order.
pub fn validate_order(raw: &[u8]) -> Result<OrderRequest> {
    let body = parse_object(raw)?;

    let event_id = required_string(
        &body,
        "eventId",
        "eventId",
        messages::EVENT_ID_REQUIRED,
        messages::EVENT_ID_TYPE,
    )?;
    let tickets = ticket_lines(&body)?;
    let user_email = email(&body, "userEmail")?;
    let user_name = user_name(&body)?;
    let payment_method = payment_method(&body)?;

    Ok(OrderRequest {
        event_id,
        tickets,
        user_email,
        user_name,
        payment_method,
    })
}

/// Validate a waitlist registration payload.
///
/// # Errors
///
/// Returns the first violated constraint in field-declaration order.
pub fn validate_waitlist(raw: &[u8]) -> Result<WaitlistIntent> {
    let body = parse_object(raw)?;

    let event_id = required_string(
        &body,
        "eventId",
        "eventId",
        messages::EVENT_ID_REQUIRED,
        messages::EVENT_ID_TYPE,
    )?;
    // A blank ticket id means any ticket type.
    let ticket_id = optional_string(&body, "ticketId", "ticketId", messages::TICKET_ID_TYPE)?
        .filter(|id| !id.is_empty());
    let email = email(&body, "email")?;
    let phone = phone(&body)?;

    Ok(WaitlistIntent::new(event_id, ticket_id, email, phone))
}

/// Check an email address for RFC 5322 dot-atom syntax.
///
/// # Examples
///
/// ```
/// use ticketgate_core::schema::is_valid_email;
///
/// assert!(is_valid_email("a@b.com"));
/// assert!(is_valid_email("user+tag@sub.example.co.uk"));
/// assert!(!is_valid_email("not-an-email"));
/// assert!(!is_valid_email("user@example"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN {
        return false;
    }

    match email.split_once('@') {
        Some((local, _)) if local.len() > MAX_EMAIL_LOCAL_LEN => false,
        Some(_) => EMAIL_PATTERN.is_match(email),
        None => false,
    }
}

/// Normalize a phone number and check international syntax.
///
/// Spaces, dashes and parentheses are stripped; the result must be a `+`
/// followed by a country code and 8 to 15 digits in total.
///
/// # Examples
///
/// ```
/// use ticketgate_core::schema::normalize_phone;
///
/// assert_eq!(normalize_phone("+91 98765-43210").as_deref(), Some("+919876543210"));
/// assert_eq!(normalize_phone("12345"), None);
/// ```
#[must_use]
pub fn normalize_phone(phone: &str) -> Option<String> {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    PHONE_PATTERN.is_match(&compact).then_some(compact)
}

fn parse_object(raw: &[u8]) -> Result<Object> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ValidationError::InvalidBody),
    }
}

/// Fetch a key, treating `null` as absent.
fn present<'a>(body: &'a Object, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|value| !value.is_null())
}

fn required_string(
    body: &Object,
    key: &str,
    path: &str,
    missing: &'static str,
    wrong_type: &'static str,
) -> Result<String> {
    match present(body, key) {
        None => Err(ValidationError::field(path, missing)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::field(path, missing)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(ValidationError::field(path, wrong_type)),
    }
}

fn optional_string(
    body: &Object,
    key: &str,
    path: &str,
    wrong_type: &'static str,
) -> Result<Option<String>> {
    match present(body, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(ValidationError::field(path, wrong_type)),
    }
}

fn ticket_lines(body: &Object) -> Result<Vec<TicketLineItem>> {
    let Some(Value::Array(lines)) = present(body, "tickets") else {
        return Err(ValidationError::field("tickets", messages::TICKETS_TYPE));
    };

    if lines.is_empty() {
        return Err(ValidationError::field("tickets", messages::TICKETS_EMPTY));
    }

    lines
        .iter()
        .enumerate()
        .map(|(index, line)| ticket_line(index, line))
        .collect()
}

fn ticket_line(index: usize, line: &Value) -> Result<TicketLineItem> {
    let Value::Object(line) = line else {
        return Err(ValidationError::field(
            format!("tickets[{index}]"),
            messages::TICKET_TYPE,
        ));
    };

    let ticket_id = required_string(
        line,
        "ticketId",
        &format!("tickets[{index}].ticketId"),
        messages::TICKET_ID_REQUIRED,
        messages::TICKET_ID_TYPE,
    )?;
    let quantity = quantity(line.get("quantity"))
        .map_err(|message| ValidationError::field(format!("tickets[{index}].quantity"), message))?;

    Ok(TicketLineItem {
        ticket_id,
        quantity,
    })
}

/// Interpret a JSON value as a per-type ticket quantity.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // bounds checked before the cast
fn quantity(value: Option<&Value>) -> std::result::Result<u32, &'static str> {
    let Some(Value::Number(number)) = value else {
        return Err(messages::QUANTITY_TYPE);
    };

    let whole = if let Some(n) = number.as_u64() {
        n
    } else if number.as_i64().is_some() {
        return Err(messages::QUANTITY_MIN);
    } else {
        let n = number.as_f64().unwrap_or(f64::NAN);
        if !n.is_finite() || n.fract() != 0.0 {
            return Err(messages::QUANTITY_WHOLE);
        }
        if n < f64::from(MIN_TICKETS_PER_TYPE) {
            return Err(messages::QUANTITY_MIN);
        }
        if n > f64::from(MAX_TICKETS_PER_TYPE) {
            return Err(messages::QUANTITY_MAX);
        }
        n as u64
    };

    if whole < u64::from(MIN_TICKETS_PER_TYPE) {
        return Err(messages::QUANTITY_MIN);
    }
    if whole > u64::from(MAX_TICKETS_PER_TYPE) {
        return Err(messages::QUANTITY_MAX);
    }

    Ok(whole as u32)
}

fn email(body: &Object, key: &str) -> Result<String> {
    match present(body, key) {
        Some(Value::String(s)) if is_valid_email(s.trim()) => Ok(s.trim().to_lowercase()),
        _ => Err(ValidationError::field(key, messages::EMAIL_INVALID)),
    }
}

fn user_name(body: &Object) -> Result<Option<String>> {
    let name = optional_string(body, "userName", "userName", messages::NAME_TOO_SHORT)?;

    match name {
        Some(name) if name.chars().count() < MIN_NAME_LEN => {
            Err(ValidationError::field("userName", messages::NAME_TOO_SHORT))
        }
        other => Ok(other),
    }
}

fn payment_method(body: &Object) -> Result<PaymentMethod> {
    match present(body, "paymentMethod") {
        None => Ok(PaymentMethod::default()),
        Some(Value::String(s)) => s.parse().map_err(|()| {
            ValidationError::field("paymentMethod", messages::PAYMENT_METHOD_INVALID)
        }),
        Some(_) => Err(ValidationError::field(
            "paymentMethod",
            messages::PAYMENT_METHOD_INVALID,
        )),
    }
}

fn phone(body: &Object) -> Result<Option<String>> {
    match present(body, "phone") {
        None => Ok(None),
        Some(Value::String(s)) => normalize_phone(s)
            .map(Some)
            .ok_or_else(|| ValidationError::field("phone", messages::PHONE_INVALID)),
        Some(_) => Err(ValidationError::field("phone", messages::PHONE_INVALID)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn order_body(overrides: &Value) -> Vec<u8> {
        let mut body = json!({
            "eventId": "evt-42",
            "tickets": [{ "ticketId": "general", "quantity": 2 }],
            "userEmail": "a@b.com",
        });
        if let (Value::Object(base), Value::Object(extra)) = (&mut body, overrides) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        serde_json::to_vec(&body).unwrap()
    }

    fn order_error(overrides: &Value) -> ValidationError {
        validate_order(&order_body(overrides)).expect_err("order should be rejected")
    }

    #[test]
    fn test_valid_order_defaults_payment_method_to_card() {
        let order = validate_order(&order_body(&json!({}))).unwrap();

        assert_eq!(order.event_id, "evt-42");
        assert_eq!(order.user_email, "a@b.com");
        assert_eq!(order.user_name, None);
        assert_eq!(order.payment_method, PaymentMethod::Card);
        assert_eq!(order.tickets, vec![TicketLineItem::new("general", 2)]);
    }

    #[test]
    fn test_unparseable_body_is_invalid_body() {
        assert_eq!(validate_order(b"{not json"), Err(ValidationError::InvalidBody));
        assert_eq!(validate_order(b""), Err(ValidationError::InvalidBody));
        assert_eq!(validate_order(b"[1, 2]"), Err(ValidationError::InvalidBody));
        assert_eq!(validate_waitlist(b"\"text\""), Err(ValidationError::InvalidBody));
    }

    #[test]
    fn test_empty_tickets_rejected() {
        let err = order_error(&json!({ "tickets": [] }));
        assert_eq!(err.to_string(), "At least one ticket is required");
    }

    #[test]
    fn test_quantity_bounds() {
        let err = order_error(&json!({ "tickets": [{ "ticketId": "vip", "quantity": 11 }] }));
        assert_eq!(err.to_string(), "Maximum 10 tickets per type");
        assert_eq!(err.field_path(), Some("tickets[0].quantity"));

        let err = order_error(&json!({ "tickets": [{ "ticketId": "vip", "quantity": 0 }] }));
        assert_eq!(err.to_string(), "Quantity must be at least 1");

        let err = order_error(&json!({ "tickets": [{ "ticketId": "vip", "quantity": -3 }] }));
        assert_eq!(err.to_string(), "Quantity must be at least 1");

        let err = order_error(&json!({ "tickets": [{ "ticketId": "vip", "quantity": 1.5 }] }));
        assert_eq!(err.to_string(), "Quantity must be a whole number");

        let err = order_error(&json!({ "tickets": [{ "ticketId": "vip", "quantity": "2" }] }));
        assert_eq!(err.to_string(), "Quantity must be a number");

        let tickets = json!({ "tickets": [{ "ticketId": "vip", "quantity": 10 }] });
        let order = validate_order(&order_body(&tickets)).unwrap();
        assert_eq!(order.tickets[0].quantity, 10);

        let tickets = json!({ "tickets": [{ "ticketId": "vip", "quantity": 3.0 }] });
        let order = validate_order(&order_body(&tickets)).unwrap();
        assert_eq!(order.tickets[0].quantity, 3);
    }

    #[test]
    fn test_email_rejected_and_normalized() {
        let err = order_error(&json!({ "userEmail": "not-an-email" }));
        assert_eq!(err.to_string(), "Invalid email address");

        let order = validate_order(&order_body(&json!({ "userEmail": "  Someone@Example.COM " })))
            .unwrap();
        assert_eq!(order.user_email, "someone@example.com");
    }

    #[test]
    fn test_first_violation_wins_in_declaration_order() {
        // Every field is broken; eventId is declared first.
        let body = json!({
            "eventId": "",
            "tickets": [],
            "userEmail": "nope",
            "userName": "x",
            "paymentMethod": "cash",
        });
        let err = validate_order(&serde_json::to_vec(&body).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Event ID is required");

        // Ticket lines are checked before the email.
        let err = order_error(&json!({
            "tickets": [{ "ticketId": "a", "quantity": 1 }, { "quantity": 1 }],
            "userEmail": "nope",
        }));
        assert_eq!(err.to_string(), "Ticket ID is required");
        assert_eq!(err.field_path(), Some("tickets[1].ticketId"));

        // Name precedes payment method.
        let err = order_error(&json!({ "userName": "x", "paymentMethod": "cash" }));
        assert_eq!(err.to_string(), "Name must be at least 2 characters");
    }

    #[test]
    fn test_payment_method_enumeration() {
        let err = order_error(&json!({ "paymentMethod": "cash" }));
        assert_eq!(err.to_string(), "Invalid payment method");

        let err = order_error(&json!({ "paymentMethod": 3 }));
        assert_eq!(err.to_string(), "Invalid payment method");

        let order = validate_order(&order_body(&json!({ "paymentMethod": "netbanking" }))).unwrap();
        assert_eq!(order.payment_method, PaymentMethod::Netbanking);

        let order = validate_order(&order_body(&json!({ "paymentMethod": null }))).unwrap();
        assert_eq!(order.payment_method, PaymentMethod::Card);
    }

    #[test]
    fn test_wrong_types_report_type_messages() {
        let err = order_error(&json!({ "eventId": 12 }));
        assert_eq!(err.to_string(), "Event ID must be a string");

        let err = order_error(&json!({ "tickets": "vip" }));
        assert_eq!(err.to_string(), "Tickets must be a list");

        let err = order_error(&json!({ "tickets": ["vip"] }));
        assert_eq!(err.to_string(), "Each ticket must be an object");
    }

    #[test]
    fn test_waitlist_phone_syntax() {
        let body = json!({ "eventId": "evt-1", "email": "a@b.com", "phone": "12345" });
        let err = validate_waitlist(&serde_json::to_vec(&body).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid phone number");

        let body = json!({ "eventId": "evt-1", "email": "a@b.com", "phone": "+919876543210" });
        let intent = validate_waitlist(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert_eq!(intent.phone(), Some("+919876543210"));
        assert_eq!(intent.ticket_id(), None);
    }

    #[test]
    fn test_waitlist_optional_fields() {
        let body = json!({
            "eventId": " evt-1 ",
            "ticketId": "balcony",
            "email": "Fan@Example.com",
            "phone": null,
        });
        let intent = validate_waitlist(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert_eq!(intent.event_id(), "evt-1");
        assert_eq!(intent.ticket_id(), Some("balcony"));
        assert_eq!(intent.email(), "fan@example.com");
        assert_eq!(intent.phone(), None);

        let body = json!({ "eventId": "evt-1", "ticketId": 7, "email": "a@b.com" });
        let err = validate_waitlist(&serde_json::to_vec(&body).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Ticket ID must be a string");
    }

    #[test]
    fn test_supplied_blank_optionals_must_meet_constraints() {
        let err = order_error(&json!({ "userName": "" }));
        assert_eq!(err.to_string(), "Name must be at least 2 characters");

        let err = order_error(&json!({ "userName": "   " }));
        assert_eq!(err.to_string(), "Name must be at least 2 characters");

        let body = json!({ "eventId": "evt-1", "email": "a@b.com", "phone": "   " });
        let err = validate_waitlist(&serde_json::to_vec(&body).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid phone number");

        let request = validate_order(&order_body(&json!({ "userName": null }))).unwrap();
        assert_eq!(request.user_name, None);
    }

    #[test]
    fn test_validate_dispatches_by_schema() {
        let order = validate(Schema::Order, &order_body(&json!({}))).unwrap();
        assert!(matches!(order, Validated::Order(_)));

        let body = br#"{"eventId":"e","email":"a@b.com"}"#;
        let waitlist = validate(Schema::WaitlistJoin, body).unwrap();
        assert!(matches!(waitlist, Validated::Waitlist(_)));
    }

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("user.name+tag@example.co.uk"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email(".user@example.com"));
        assert!(!is_valid_email("user..name@example.com"));
        assert!(!is_valid_email("user@-example.com"));
        assert!(!is_valid_email(&format!("{}@example.com", "a".repeat(65))));
    }

    proptest! {
        #[test]
        fn prop_validation_is_deterministic(raw in proptest::collection::vec(any::<u8>(), 0..64)) {
            prop_assert_eq!(validate_order(&raw), validate_order(&raw));
            prop_assert_eq!(validate_waitlist(&raw), validate_waitlist(&raw));
        }

        #[test]
        fn prop_quantity_accepted_only_within_bounds(quantity in -5i64..40) {
            let tickets = json!({ "tickets": [{ "ticketId": "vip", "quantity": quantity }] });
            let body = order_body(&tickets);
            let accepted = validate_order(&body).is_ok();
            prop_assert_eq!(accepted, (1..=10).contains(&quantity));
        }
    }
}

//! Message rendering — turns an order payload into an email subject and body.
//!
//! Rendering is pure: the same payload always produces the same bytes. Money
//! is shown with two decimals, rounding half away from zero.

use std::borrow::Cow;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::Value;

use crate::error::RenderError;
use crate::mail::BodyFormat;
use crate::order::{OrderEvent, OrderItem};

/// Subject used when the order summary is not rendered.
pub const PLACEHOLDER_SUBJECT: &str = "New website order ✔";

/// Body used when the order summary is not rendered.
pub const PLACEHOLDER_BODY: &str = "A new order was placed on the website.";

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 0; padding: 0; background-color: #f4f4f4; }
.container { max-width: 600px; margin: auto; background: #ffffff; padding: 20px; border-radius: 8px; }
section { margin-bottom: 20px; padding: 10px; border: 1px solid #ddd; border-radius: 5px; }
table { width: 100%; border-collapse: collapse; margin-top: 10px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
.total { font-weight: bold; font-size: 1.2em; }";

/// Display-ready email content for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
    pub format: BodyFormat,
}

impl RenderedMessage {
    pub fn placeholder() -> Self {
        Self {
            subject: PLACEHOLDER_SUBJECT.to_string(),
            body: PLACEHOLDER_BODY.to_string(),
            format: BodyFormat::PlainText,
        }
    }
}

/// Render `payload`.
///
/// With `render_template` off the payload is ignored and the placeholder
/// message is returned. Otherwise every order field must be present and
/// well-formed.
pub fn render(payload: Option<&Value>, render_template: bool) -> Result<RenderedMessage, RenderError> {
    if !render_template {
        return Ok(RenderedMessage::placeholder());
    }

    let payload = payload.ok_or(RenderError::MissingPayload)?;
    let order = OrderEvent::deserialize(payload)?;
    Ok(render_order(&order))
}

/// Render a parsed order as an HTML summary.
pub fn render_order(order: &OrderEvent) -> RenderedMessage {
    let subject = format!(
        "New website order ✔ ({} - {})",
        order.customer.name, order.customer.email
    );

    let rows: String = order.order_items.iter().map(item_row).collect();

    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Order Summary</title>
<style>
{style}
</style>
</head>
<body>
<div class="container">
<h1>Order Summary</h1>
<section class="order-details">
<h2>Order ID: {order_id}</h2>
<p>Date: {order_date}</p>
</section>
<section class="customer-details">
<h2>Customer Details</h2>
<p>Name: {name}</p>
<p>Email: {email}</p>
</section>
<section class="order-items">
<h2>Order Items</h2>
<table>
<thead>
<tr><th>Product Name</th><th>Quantity</th><th>Price</th></tr>
</thead>
<tbody>
{rows}</tbody>
</table>
<p class="total">Total Amount: {total}</p>
</section>
<section class="payment-details">
<h2>Payment Details</h2>
<p>Payment Method: {method}</p>
<p>Transaction ID: {transaction_id}</p>
</section>
</div>
</body>
</html>
"#,
        style = STYLE,
        order_id = escape_html(&order.order_id.to_string()),
        order_date = escape_html(&order.order_date.to_string()),
        name = escape_html(&order.customer.name),
        email = escape_html(&order.customer.email),
        rows = rows,
        total = format_money(order.total_amount),
        method = escape_html(&order.payment.method),
        transaction_id = escape_html(&order.payment.transaction_id),
    );

    RenderedMessage {
        subject,
        body,
        format: BodyFormat::Html,
    }
}

fn item_row(item: &OrderItem) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        escape_html(&item.product_name),
        item.quantity,
        format_money(item.price)
    )
}

/// `$` followed by the amount with exactly two decimals, midpoints rounded
/// away from zero.
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    format!("${rounded}")
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

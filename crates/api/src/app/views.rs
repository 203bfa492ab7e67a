//! Server-rendered HTML pages.
//!
//! All user-supplied text goes through [`escape`] before it reaches markup.

use std::fmt::Write;

use stockroom_catalog::validation::fields;
use stockroom_catalog::{Product, ProductForm};
use stockroom_core::FieldErrors;
use stockroom_infra::ProductPage;

/// Escape text for use in HTML element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="/styles.css">
</head>
<body>
<header><a href="/">Stockroom</a></header>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

/// `/`: every product with its stock and prices.
pub fn products_list(products: &[Product]) -> String {
    let mut body = String::from(r#"<p><a class="button" href="/products/new">New product</a></p>"#);

    if products.is_empty() {
        body.push_str(r#"<p class="empty">No products yet.</p>"#);
        return layout("All products", &body);
    }

    body.push_str(
        "<table>\n<thead><tr><th>Name</th><th>Quantity</th><th>Purchase price</th>\
         <th>Sell price</th><th></th></tr></thead>\n<tbody>\n",
    );
    for p in products {
        let class = if p.in_stock() { "" } else { r#" class="out-of-stock""# };
        let _ = writeln!(
            body,
            r#"<tr{class}><td><a href="/products/{id}">{name}</a></td><td>{quantity}</td><td>{purchase}</td><td>{sell}</td><td><a href="/products/{id}/edit">edit</a></td></tr>"#,
            id = p.id_typed(),
            name = escape(p.name()),
            quantity = p.quantity(),
            purchase = p.purchase_price(),
            sell = p.sell_price(),
        );
    }
    body.push_str("</tbody>\n</table>");

    layout("All products", &body)
}

/// `/products/:id`: details, sell form and sale history.
///
/// `quantity` refills the sell input after a failed attempt.
pub fn product_page(page: &ProductPage, quantity: &str, error: Option<&str>) -> String {
    let p = &page.product;
    let id = p.id_typed();
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<dl class="product">
<dt>Stock</dt><dd id="stock">{quantity}</dd>
<dt>Purchase price</dt><dd>{purchase}</dd>
<dt>Sell price</dt><dd>{sell}</dd>
<dt>Margin</dt><dd>{margin}</dd>
</dl>
"#,
        quantity = p.quantity(),
        purchase = p.purchase_price(),
        sell = p.sell_price(),
        margin = p.margin(),
    );

    let _ = write!(
        body,
        r#"<form method="post" action="/products/{id}" class="sell">
<label for="quantity">Sell quantity</label>
<input id="quantity" name="{field}" value="{value}" inputmode="numeric">
{error}<button type="submit">Sell</button>
</form>
"#,
        field = fields::QUANTITY,
        value = escape(quantity),
        error = field_error(error),
    );

    let _ = write!(
        body,
        r#"<p><a href="/products/{id}/edit">Edit</a></p>
<h2>Sales</h2>
"#
    );

    if page.sales.is_empty() {
        body.push_str(r#"<p class="empty">No sales yet.</p>"#);
    } else {
        body.push_str(
            "<table class=\"sales\">\n<thead><tr><th>Date</th><th>Quantity</th><th>Total</th></tr></thead>\n<tbody>\n",
        );
        for sale in &page.sales {
            let _ = writeln!(
                body,
                "<tr><td>{date}</td><td>{quantity}</td><td>{total}</td></tr>",
                date = sale.date.format("%Y-%m-%d %H:%M:%S"),
                quantity = sale.quantity,
                total = sale.total(p.sell_price()),
            );
        }
        body.push_str("</tbody>\n</table>");
    }

    layout(p.name(), &body)
}

/// Where a product form posts and what it is titled.
#[derive(Debug, Clone, Copy)]
pub enum FormTarget {
    New,
    Edit(stockroom_core::ProductId),
}

/// Create/edit form, with any validation messages next to their fields.
pub fn product_form(target: FormTarget, form: &ProductForm, errors: &FieldErrors) -> String {
    let (title, action) = match target {
        FormTarget::New => ("New product".to_string(), "/products/new".to_string()),
        FormTarget::Edit(id) => (format!("Edit product #{id}"), format!("/products/{id}/edit")),
    };

    let mut body = format!(r#"<form method="post" action="{action}" class="product-form">"#);
    body.push('\n');
    for (field, label, value) in [
        (fields::NAME, "Name", &form.name),
        (fields::QUANTITY, "Quantity", &form.quantity),
        (fields::PURCHASE_PRICE, "Purchase price", &form.purchase_price),
        (fields::SELL_PRICE, "Sell price", &form.sell_price),
    ] {
        let _ = writeln!(
            body,
            r#"<label for="{field}">{label}</label>
<input id="{field}" name="{field}" value="{value}">
{error}"#,
            value = escape(value),
            error = field_error(errors.get(field)),
        );
    }
    body.push_str("<button type=\"submit\">Save</button>\n</form>\n");

    if let FormTarget::Edit(id) = target {
        let _ = write!(
            body,
            r#"<form method="post" action="/products/{id}/delete" class="delete">
<button type="submit">Delete</button>
</form>
"#
        );
    }

    layout(&title, &body)
}

/// Generic error page.
pub fn error_page(title: &str, message: &str) -> String {
    layout(title, &format!(r#"<p class="error">{}</p>"#, escape(message)))
}

fn field_error(message: Option<&str>) -> String {
    match message {
        Some(m) => format!("<p class=\"field-error\">{}</p>\n", escape(m)),
        None => String::new(),
    }
}

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::error::{AppError, Result};
use crate::models::{CheckoutCustomer, CheckoutItem, format_cop};

pub type Mailer = AsyncSmtpTransport<Tokio1Executor>;

pub async fn send_new_order_email(
    mailer: &Mailer,
    mail: &MailConfig,
    order_code: &str,
    customer: &CheckoutCustomer,
    items: &[CheckoutItem],
    total_cents: i64,
    payment_link: Option<&str>,
) -> Result<()> {
    let customer_email = customer.email.as_deref().unwrap_or_default().trim();
    let customer_phone = customer.phone.as_deref().unwrap_or_default().trim();
    let customer_address = customer.address.as_deref().unwrap_or_default().trim();

    let html_template = include_str!("../utils/new_order.html");
    let html = html_template
        .replace("{{order_code}}", &escape_html(order_code))
        .replace("{{customer_email}}", &escape_html(customer_email))
        .replace("{{customer_phone}}", &escape_html(customer_phone))
        .replace("{{customer_address}}", &escape_html(customer_address))
        .replace("{{items_rows}}", &items_rows(items))
        .replace("{{total_cop}}", &format_cop(total_cents))
        .replace("{{pay_button}}", &pay_button(payment_link))
        .replace("{{app_name}}", &escape_html(&mail.from_name));

    let mut builder = Message::builder()
        .from(mailbox(Some(&mail.from_name), &mail.from_address)?)
        .to(mailbox(None, &mail.orders_to)?)
        .subject(format!("Nueva orden #{}", order_code))
        .header(ContentType::TEXT_HTML);

    // The customer gets a copy and replies go straight to them.
    if let Ok(customer_box) = customer_email.parse::<Mailbox>() {
        builder = builder.cc(customer_box.clone()).reply_to(customer_box);
    }

    let message = builder
        .body(html)
        .map_err(|e| AppError::InternalError(format!("Failed to build order email: {}", e)))?;

    mailer.send(message).await.map_err(|e| {
        tracing::error!("Failed to send order email: {:?}", e);
        AppError::InternalError("No se pudo enviar el correo. Intenta más tarde.".to_string())
    })?;

    Ok(())
}

pub async fn send_contact_email(
    mailer: &Mailer,
    mail: &MailConfig,
    name: &str,
    email: &str,
    message_text: &str,
) -> Result<()> {
    let html_template = include_str!("../utils/contact.html");
    let html = html_template
        .replace("{{name}}", &escape_html(name))
        .replace("{{email}}", &escape_html(email))
        .replace("{{message}}", &escape_html(message_text));

    let mut builder = Message::builder()
        .from(mailbox(Some(&mail.from_name), &mail.from_address)?)
        .to(mailbox(None, &mail.contact_to)?)
        .subject(format!("Nuevo mensaje de contacto de {}", name))
        .header(ContentType::TEXT_HTML);

    if let Ok(sender) = email.parse::<Mailbox>() {
        builder = builder.reply_to(sender);
    }

    let message = builder
        .body(html)
        .map_err(|e| AppError::InternalError(format!("Failed to build contact email: {}", e)))?;

    mailer.send(message).await.map_err(|e| {
        tracing::error!("Failed to send contact email: {:?}", e);
        AppError::InternalError("No se pudo enviar el mensaje. Intenta más tarde.".to_string())
    })?;

    Ok(())
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox> {
    let address = address
        .parse()
        .map_err(|e| AppError::ConfigError(format!("Invalid mail address {}: {}", address, e)))?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

fn items_rows(items: &[CheckoutItem]) -> String {
    let mut rows = String::new();
    for item in items {
        let mut label = escape_html(&item.name);
        if let Some(size) = item.size.as_deref().filter(|s| !s.trim().is_empty()) {
            label.push_str(&format!(" (Talla {})", escape_html(size)));
        }
        if let Some(color) = item.color.as_deref().filter(|c| !c.trim().is_empty()) {
            label.push_str(&format!(" - {}", escape_html(&capitalize(color))));
        }
        rows.push_str(&format!(
            "<tr><td style=\"color:#111827;\">{}</td><td align=\"center\" style=\"color:#111827;\">{}</td><td align=\"right\" style=\"color:#111827;\">{}</td></tr>\n",
            label,
            item.qty,
            format_cop(item.price_cents)
        ));
    }
    rows
}

fn pay_button(link: Option<&str>) -> String {
    match link {
        Some(url) => format!(
            "<p style=\"margin:20px 0 4px;\"><a href=\"{}\" style=\"background:#111827;color:#ffffff;padding:12px 24px;border-radius:8px;text-decoration:none;display:inline-block;\">Pagar con Bold</a></p>",
            escape_html(url)
        ),
        None => String::new(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, size: Option<&str>, color: Option<&str>, qty: i64, price: i64) -> CheckoutItem {
        CheckoutItem {
            product_id: Some(1),
            name: name.to_string(),
            size: size.map(str::to_string),
            color: color.map(str::to_string),
            qty,
            price_cents: price,
            image: None,
        }
    }

    #[test]
    fn escapes_html_entities() {
        assert_eq!(
            escape_html(r#"<b>"x" & 'y'</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("camiseta ñandú"), "camiseta ñandú");
    }

    #[test]
    fn items_rows_include_size_and_capitalized_color() {
        let rows = items_rows(&[item("Camiseta", Some("M"), Some("negro"), 2, 120000)]);
        assert!(rows.contains("Camiseta (Talla M) - Negro"));
        assert!(rows.contains(">2<"));
        assert!(rows.contains("$1.200"));
    }

    #[test]
    fn items_rows_escape_user_content() {
        let rows = items_rows(&[item("<script>alert(1)</script>", None, None, 1, 100)]);
        assert!(!rows.contains("<script>"));
        assert!(rows.contains("&lt;script&gt;"));
    }

    #[test]
    fn pay_button_only_renders_with_link() {
        assert_eq!(pay_button(None), "");
        let button = pay_button(Some("https://checkout.bold.co/link/abc"));
        assert!(button.contains("href=\"https://checkout.bold.co/link/abc\""));
        assert!(button.contains("Pagar con Bold"));
    }

    #[test]
    fn capitalize_handles_multibyte_first_char() {
        assert_eq!(capitalize("negro"), "Negro");
        assert_eq!(capitalize("ñandú"), "Ñandú");
        assert_eq!(capitalize(""), "");
    }
}

use ammonia::clean_text;
use chrono::DateTime;
use chrono_tz::Tz;

use crate::entities::{
    contact::SubmissionRequest,
    email::{DispatchConfig, OutboundEmail, OrganizationProfile},
};

const BRAND_COLOR: &str = "#a476ff";
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Email to the team with every captured field.
pub fn team_notification(
    request: &SubmissionRequest,
    config: &DispatchConfig,
    received_at: DateTime<Tz>,
) -> OutboundEmail {
    let optional_rows = [("Company", &request.company), ("Phone", &request.phone)]
        .into_iter()
        .filter_map(|(label, value)| {
            value.as_deref().map(|v| format!("<p><strong>{}:</strong> {}</p>", label, clean_text(v)))
        })
        .collect::<String>();

    let html = format!(
        r##"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: {brand};">New Contact Form Submission</h2>
  <div style="background: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3 style="margin-top: 0;">Contact Information</h3>
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> {email}</p>
    {optional_rows}
  </div>
  <div style="background: #ffffff; padding: 20px; border-radius: 8px; border-left: 4px solid {brand};">
    <h3 style="margin-top: 0;">Message</h3>
    <p style="white-space: pre-wrap;">{message}</p>
  </div>
  <div style="margin-top: 20px; padding: 15px; background: #e3f2fd; border-radius: 8px;">
    <p style="margin: 0; font-size: 14px; color: #666;">
      <strong>Sent from:</strong> {organization} Contact Form<br>
      <strong>Time:</strong> {time}
    </p>
  </div>
</div>"##,
        brand = BRAND_COLOR,
        name = clean_text(&request.name),
        email = clean_text(&request.email),
        optional_rows = optional_rows,
        message = clean_text(&request.message),
        organization = clean_text(&config.organization.name),
        time = received_at.format(TIMESTAMP_FORMAT),
    );

    OutboundEmail {
        from: config.team_sender.clone(),
        to: vec![config.team_recipient.clone()],
        subject: format!("New Contact Form Submission from {}", request.name),
        html,
    }
}

/// Acknowledgment to the submitter, restating how to reach the organization.
pub fn user_confirmation(request: &SubmissionRequest, config: &DispatchConfig) -> OutboundEmail {
    let OrganizationProfile { name, tagline, email, phone, address, footer } = &config.organization;

    let html = format!(
        r##"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="text-align: center; margin-bottom: 30px;">
    <h1 style="color: {brand};">{org}</h1>
    <p style="color: #666;">{tagline}</p>
  </div>
  <h2>Thank you for your message, {submitter}!</h2>
  <p>We've received your message and will get back to you within 24 hours.</p>
  <div style="background: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3 style="margin-top: 0;">Your Message</h3>
    <p style="white-space: pre-wrap; font-style: italic;">"{message}"</p>
  </div>
  <div style="margin-top: 30px; padding: 20px; background: linear-gradient(135deg, {brand}, #7c52ef); border-radius: 8px; color: white;">
    <h3 style="margin-top: 0; color: white;">Contact Information</h3>
    <p style="margin: 5px 0;">📧 {email}</p>
    <p style="margin: 5px 0;">📱 {phone}</p>
    <p style="margin: 5px 0;">🏢 {address}</p>
  </div>
  <div style="text-align: center; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee;">
    <p style="font-size: 14px; color: #666;">
      {org}<br>
      {footer}
    </p>
  </div>
</div>"##,
        brand = BRAND_COLOR,
        org = clean_text(name),
        tagline = clean_text(tagline),
        submitter = clean_text(&request.name),
        message = clean_text(&request.message),
        email = clean_text(email),
        phone = clean_text(phone),
        address = clean_text(address),
        footer = clean_text(footer),
    );

    OutboundEmail {
        from: config.user_sender.clone(),
        to: vec![request.email.clone()],
        subject: format!("Thank you for contacting {}", name),
        html,
    }
}

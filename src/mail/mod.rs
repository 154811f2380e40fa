//! # 邮件发送模块
//!
//! 确认链接与绑定完成通知通过 SMTP 发出；未配置 SMTP 时退化为日志记录

use crate::config::SmtpConfig;
use crate::error::{OauthError, Result};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, SinglePart},
    transport::smtp::authentication::Credentials,
};

/// 出站邮件发送能力
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

/// SMTP 邮件发送器
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| OauthError::Mail(format!("SMTP relay 构建失败: {e}")))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| OauthError::Mail(format!("发件人地址无效: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| OauthError::Mail(format!("收件人地址无效: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .singlepart(SinglePart::html(html_body.to_string()))
            .map_err(|e| OauthError::Mail(format!("邮件构建失败: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| OauthError::Mail(format!("邮件发送失败: {e}")))?;
        Ok(())
    }
}

/// 未配置 SMTP 时的占位实现，仅把邮件写入日志
pub struct LogMailer;

#[async_trait]
impl MailSender for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        tracing::info!(to, subject, body = html_body, "SMTP 未配置，邮件仅记录日志");
        Ok(())
    }
}

/// 邮箱确认邮件正文
pub fn confirmation_mail_body(confirm_url: &str) -> String {
    format!(
        "<p>Please click the link below to bind your email</p>\
         <a href=\"{confirm_url}\" rel=\"bookmark\">{confirm_url}</a>\
         <br/>\
         If the link above cannot be opened, please copy this link to your browser.\
         <br/>{confirm_url}"
    )
}

/// 绑定完成通知邮件正文
pub fn link_complete_mail_body(provider: &str, site_url: &str) -> String {
    format!(
        "<p>Congratulations, you have successfully bound your email address. \
         You can use {provider} to directly log in to this website without a password.</p>\
         You are welcome to continue to follow this site, the address is \
         <a href=\"{site_url}\" rel=\"bookmark\">{site_url}</a>\
         <br/>\
         If the link above cannot be opened, please copy this link to your browser.\
         {site_url}"
    )
}

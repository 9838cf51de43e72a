use crate::domain::model::Locale;
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::{validate_email, validate_non_empty_string};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 聯絡表單內容；只在本地驗證與確認，不會送出任何網路請求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub car_id: Option<String>,
    pub preferred_locale: Locale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAcknowledgement {
    pub reference: String,
    pub received_at: DateTime<Utc>,
    /// 確認訊息的翻譯 key
    pub message_key: &'static str,
    pub locale: Locale,
}

pub const ACK_MESSAGE_KEY: &str = "contact.form.success";

impl ContactForm {
    /// 回傳所有欄位錯誤，而不是只回第一個
    pub fn validate(&self) -> std::result::Result<(), Vec<CatalogError>> {
        let checks = [
            validate_non_empty_string("name", &self.name),
            validate_non_empty_string("email", &self.email).and_then(|_| validate_email("email", &self.email)),
            validate_non_empty_string("message", &self.message),
        ];

        let errors: Vec<CatalogError> = checks.into_iter().filter_map(|check| check.err()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn acknowledge(&self) -> Result<ContactAcknowledgement> {
        if let Err(mut errors) = self.validate() {
            return Err(errors.remove(0));
        }

        let received_at = Utc::now();
        let ack = ContactAcknowledgement {
            reference: format!("AH-{}", received_at.format("%Y%m%d%H%M%S")),
            received_at,
            message_key: ACK_MESSAGE_KEY,
            locale: self.preferred_locale,
        };
        tracing::info!("📨 Contact request {} acknowledged locally", ack.reference);
        Ok(ack)
    }
}

//! Board endpoints: notices, FAQ and one-to-one inquiries.
//!
//! Notice and FAQ reads are public and go out without a token. Notice
//! writes hit the same paths, so they attach the token explicitly.

use anyhow::{Context, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::{ApiClient, ApiError};
use crate::models::board::from_envelope;
use crate::models::{FaqItem, Inquiry, InquiryDraft, ListQuery, Notice, NoticeDraft, NoticeUpdate, Page};

const NOTICES: &str = "/api/notices";
const FAQS: &str = "/api/faqs";
const INQUIRIES: &str = "/api/inquiries";

fn list_path(base: &str) -> String {
    format!("{}/", base)
}

fn detail_path(base: &str, id: i64) -> String {
    format!("{}/{}/", base, id)
}

fn decode<T: DeserializeOwned>(body: Value, path: &str) -> Result<T> {
    from_envelope(body)
        .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
        .with_context(|| format!("Unexpected board response from {}", path))
}

impl ApiClient {
    async fn board_list<T: DeserializeOwned>(&self, path: &str, query: &ListQuery) -> Result<Page<T>> {
        let body: Value = self.get_json(path, query).await?;
        decode(body, path)
    }

    async fn board_detail<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body: Value = self.get(path).await?;
        decode(body, path)
    }

    async fn board_write<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let response = self.send(method, path, Some(body), true).await?;
        let text = response.text().await.context("Failed to read board response")?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))?;
        decode(body, path)
    }

    // ===== Notices =====

    pub async fn fetch_notices(&self, query: &ListQuery) -> Result<Page<Notice>> {
        self.board_list(&list_path(NOTICES), query).await
    }

    /// Fetching a notice counts as a view on the server.
    pub async fn fetch_notice(&self, id: i64) -> Result<Notice> {
        self.board_detail(&detail_path(NOTICES, id)).await
    }

    pub async fn create_notice(&self, draft: &NoticeDraft) -> Result<Notice> {
        self.board_write(Method::POST, &list_path(NOTICES), draft).await
    }

    pub async fn update_notice(&self, id: i64, update: &NoticeUpdate) -> Result<Notice> {
        self.board_write(Method::PATCH, &detail_path(NOTICES, id), update).await
    }

    pub async fn delete_notice(&self, id: i64) -> Result<()> {
        self.send::<()>(Method::DELETE, &detail_path(NOTICES, id), None, true)
            .await?;
        Ok(())
    }

    // ===== FAQ =====

    pub async fn fetch_faqs(&self, query: &ListQuery) -> Result<Page<FaqItem>> {
        self.board_list(&list_path(FAQS), query).await
    }

    pub async fn fetch_faq(&self, id: i64) -> Result<FaqItem> {
        self.board_detail(&detail_path(FAQS, id)).await
    }

    // ===== Inquiries =====

    /// Own inquiries; staff accounts see everyone's.
    pub async fn fetch_inquiries(&self, query: &ListQuery) -> Result<Page<Inquiry>> {
        self.board_list(&list_path(INQUIRIES), query).await
    }

    pub async fn fetch_inquiry(&self, id: i64) -> Result<Inquiry> {
        self.board_detail(&detail_path(INQUIRIES, id)).await
    }

    pub async fn create_inquiry(&self, draft: &InquiryDraft) -> Result<Inquiry> {
        self.board_write(Method::POST, &list_path(INQUIRIES), draft).await
    }

    /// Staff reply to an inquiry.
    pub async fn answer_inquiry(&self, id: i64, answer: &str) -> Result<Inquiry> {
        self.board_write(Method::PATCH, &detail_path(INQUIRIES, id), &json!({ "answer": answer }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_keep_trailing_slash() {
        assert_eq!(list_path(NOTICES), "/api/notices/");
        assert_eq!(detail_path(INQUIRIES, 9), "/api/inquiries/9/");
    }

    #[test]
    fn test_decode_faq_page() {
        let body = json!({"count": 1, "results": [{"id": 1, "question": "회원가입은?", "answer": "..."}]});
        let page: Page<FaqItem> = decode(body, "/api/faqs/").expect("decodes");
        assert_eq!(page.results[0].question, "회원가입은?");
    }

    #[test]
    fn test_decode_reports_path() {
        let err = decode::<Notice>(json!({"unexpected": true}), "/api/notices/1/").expect_err("missing fields");
        assert!(format!("{:#}", err).contains("/api/notices/1/"));
    }
}

//! Resource convenience methods.
//!
//! Each method is a fixed path template plus a verb, delegating to
//! `SchoolClient::call`. Ids are percent-encoded into their path segment.
//! Bodies are forwarded as given; no method validates, paginates, or caches.

use serde::Serialize;

use crate::client::{Query, RequestOptions, SchoolClient};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::{DeviceRegistration, Envelope};

/// Percent-encode `raw` as a single path segment, so an id containing
/// `/`, `?` or `#` cannot change the route or start a query.
fn segment(raw: &str) -> String {
    match raw {
        "." => return "%2E".to_string(),
        ".." => return "%2E%2E".to_string(),
        _ => {}
    }
    let Ok(mut url) = reqwest::Url::parse("http://segment.invalid/") else {
        return raw.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(raw);
    }
    url.path().trim_start_matches('/').to_string()
}

impl SchoolClient {
    // -----------------------------------------------------------------------
    // Attendance
    // -----------------------------------------------------------------------

    pub async fn student_attendance(
        &self,
        student_id: &str,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Envelope, ApiError> {
        let query = Query::new().opt("month", month).opt("year", year);
        self.call(
            &format!("/attendance/student/{}", segment(student_id)),
            RequestOptions::get().query(query),
        )
        .await
    }

    pub async fn class_attendance(
        &self,
        class_id: &str,
        date: Option<&str>,
    ) -> Result<Envelope, ApiError> {
        self.call(
            &format!("/attendance/class/{}", segment(class_id)),
            RequestOptions::get().query(Query::new().opt("date", date)),
        )
        .await
    }

    pub async fn mark_attendance<B: Serialize + ?Sized>(
        &self,
        record: &B,
    ) -> Result<Envelope, ApiError> {
        self.call("/attendance", RequestOptions::post(record)?).await
    }

    pub async fn update_attendance<B: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &B,
    ) -> Result<Envelope, ApiError> {
        self.call(&format!("/attendance/{}", segment(id)), RequestOptions::put(patch)?)
            .await
    }

    // -----------------------------------------------------------------------
    // Fees
    // -----------------------------------------------------------------------

    pub async fn fees(&self, status: Option<&str>) -> Result<Envelope, ApiError> {
        self.call(
            "/fees",
            RequestOptions::get().query(Query::new().opt("status", status)),
        )
        .await
    }

    pub async fn student_fees(&self, student_id: &str) -> Result<Envelope, ApiError> {
        self.call(&format!("/fees/student/{}", segment(student_id)), RequestOptions::get())
            .await
    }

    pub async fn create_fee<B: Serialize + ?Sized>(&self, fee: &B) -> Result<Envelope, ApiError> {
        self.call("/fees", RequestOptions::post(fee)?).await
    }

    pub async fn pay_fee<B: Serialize + ?Sized>(
        &self,
        fee_id: &str,
        payment: &B,
    ) -> Result<Envelope, ApiError> {
        self.call(&format!("/fees/{}/pay", segment(fee_id)), RequestOptions::post(payment)?)
            .await
    }

    // -----------------------------------------------------------------------
    // Homework
    // -----------------------------------------------------------------------

    pub async fn homework(
        &self,
        class_id: Option<&str>,
        subject: Option<&str>,
    ) -> Result<Envelope, ApiError> {
        let query = Query::new().opt("classId", class_id).opt("subject", subject);
        self.call("/homework", RequestOptions::get().query(query))
            .await
    }

    pub async fn create_homework<B: Serialize + ?Sized>(
        &self,
        homework: &B,
    ) -> Result<Envelope, ApiError> {
        self.call("/homework", RequestOptions::post(homework)?).await
    }

    pub async fn update_homework<B: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &B,
    ) -> Result<Envelope, ApiError> {
        self.call(&format!("/homework/{}", segment(id)), RequestOptions::put(patch)?)
            .await
    }

    pub async fn delete_homework(&self, id: &str) -> Result<Envelope, ApiError> {
        self.call(&format!("/homework/{}", segment(id)), RequestOptions::delete())
            .await
    }

    pub async fn submit_homework<B: Serialize + ?Sized>(
        &self,
        id: &str,
        submission: &B,
    ) -> Result<Envelope, ApiError> {
        self.call(
            &format!("/homework/{}/submit", segment(id)),
            RequestOptions::post(submission)?,
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub async fn events(&self, month: Option<u32>, year: Option<i32>) -> Result<Envelope, ApiError> {
        let query = Query::new().opt("month", month).opt("year", year);
        self.call("/events", RequestOptions::get().query(query)).await
    }

    pub async fn create_event<B: Serialize + ?Sized>(&self, event: &B) -> Result<Envelope, ApiError> {
        self.call("/events", RequestOptions::post(event)?).await
    }

    pub async fn update_event<B: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &B,
    ) -> Result<Envelope, ApiError> {
        self.call(&format!("/events/{}", segment(id)), RequestOptions::put(patch)?)
            .await
    }

    pub async fn delete_event(&self, id: &str) -> Result<Envelope, ApiError> {
        self.call(&format!("/events/{}", segment(id)), RequestOptions::delete())
            .await
    }

    // -----------------------------------------------------------------------
    // Notices
    // -----------------------------------------------------------------------

    pub async fn notices(&self, audience: Option<&str>) -> Result<Envelope, ApiError> {
        self.call(
            "/notices",
            RequestOptions::get().query(Query::new().opt("audience", audience)),
        )
        .await
    }

    pub async fn create_notice<B: Serialize + ?Sized>(
        &self,
        notice: &B,
    ) -> Result<Envelope, ApiError> {
        self.call("/notices", RequestOptions::post(notice)?).await
    }

    pub async fn update_notice<B: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &B,
    ) -> Result<Envelope, ApiError> {
        self.call(&format!("/notices/{}", segment(id)), RequestOptions::put(patch)?)
            .await
    }

    pub async fn delete_notice(&self, id: &str) -> Result<Envelope, ApiError> {
        self.call(&format!("/notices/{}", segment(id)), RequestOptions::delete())
            .await
    }

    // -----------------------------------------------------------------------
    // Schedules
    // -----------------------------------------------------------------------

    pub async fn schedules(&self, date: Option<&str>) -> Result<Envelope, ApiError> {
        self.call(
            "/schedules",
            RequestOptions::get().query(Query::new().opt("date", date)),
        )
        .await
    }

    pub async fn create_schedule<B: Serialize + ?Sized>(
        &self,
        schedule: &B,
    ) -> Result<Envelope, ApiError> {
        self.call("/schedules", RequestOptions::post(schedule)?).await
    }

    pub async fn update_schedule<B: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &B,
    ) -> Result<Envelope, ApiError> {
        self.call(&format!("/schedules/{}", segment(id)), RequestOptions::put(patch)?)
            .await
    }

    pub async fn delete_schedule(&self, id: &str) -> Result<Envelope, ApiError> {
        self.call(&format!("/schedules/{}", segment(id)), RequestOptions::delete())
            .await
    }

    // -----------------------------------------------------------------------
    // Timetable
    // -----------------------------------------------------------------------

    pub async fn timetable(&self, class_id: &str, day: Option<&str>) -> Result<Envelope, ApiError> {
        self.call(
            &format!("/timetable/{}", segment(class_id)),
            RequestOptions::get().query(Query::new().opt("day", day)),
        )
        .await
    }

    pub async fn update_timetable<B: Serialize + ?Sized>(
        &self,
        class_id: &str,
        timetable: &B,
    ) -> Result<Envelope, ApiError> {
        self.call(
            &format!("/timetable/{}", segment(class_id)),
            RequestOptions::put(timetable)?,
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Results
    // -----------------------------------------------------------------------

    pub async fn student_results(
        &self,
        student_id: &str,
        term: Option<&str>,
    ) -> Result<Envelope, ApiError> {
        self.call(
            &format!("/results/student/{}", segment(student_id)),
            RequestOptions::get().query(Query::new().opt("term", term)),
        )
        .await
    }

    pub async fn result(&self, id: &str) -> Result<Envelope, ApiError> {
        self.call(&format!("/results/{}", segment(id)), RequestOptions::get())
            .await
    }

    pub async fn create_result<B: Serialize + ?Sized>(
        &self,
        result: &B,
    ) -> Result<Envelope, ApiError> {
        self.call("/results", RequestOptions::post(result)?).await
    }

    pub async fn update_result<B: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &B,
    ) -> Result<Envelope, ApiError> {
        self.call(&format!("/results/{}", segment(id)), RequestOptions::put(patch)?)
            .await
    }

    // -----------------------------------------------------------------------
    // Hostel
    // -----------------------------------------------------------------------

    pub async fn hostel_rooms(&self, available_only: bool) -> Result<Envelope, ApiError> {
        self.call(
            "/hostel/rooms",
            RequestOptions::get().query(Query::new().flag("available", available_only)),
        )
        .await
    }

    pub async fn hostel_allocation(&self, student_id: &str) -> Result<Envelope, ApiError> {
        self.call(&format!("/hostel/student/{}", segment(student_id)), RequestOptions::get())
            .await
    }

    pub async fn allocate_hostel<B: Serialize + ?Sized>(
        &self,
        allocation: &B,
    ) -> Result<Envelope, ApiError> {
        self.call("/hostel/allocate", RequestOptions::post(allocation)?)
            .await
    }

    pub async fn file_hostel_complaint<B: Serialize + ?Sized>(
        &self,
        complaint: &B,
    ) -> Result<Envelope, ApiError> {
        self.call("/hostel/complaints", RequestOptions::post(complaint)?)
            .await
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    pub async fn notifications(&self, unread_only: bool) -> Result<Envelope, ApiError> {
        self.call(
            "/notifications",
            RequestOptions::get().query(Query::new().flag("unreadOnly", unread_only)),
        )
        .await
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<Envelope, ApiError> {
        self.call(
            &format!("/notifications/{}/read", segment(id)),
            RequestOptions::with_method(HttpMethod::Put),
        )
        .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<Envelope, ApiError> {
        self.call(
            "/notifications/read-all",
            RequestOptions::with_method(HttpMethod::Put),
        )
        .await
    }

    pub async fn delete_notification(&self, id: &str) -> Result<Envelope, ApiError> {
        self.call(&format!("/notifications/{}", segment(id)), RequestOptions::delete())
            .await
    }

    /// Register this device's push token with the backend.
    pub async fn register_device(
        &self,
        device_token: &str,
        platform: &str,
    ) -> Result<Envelope, ApiError> {
        let body = DeviceRegistration {
            device_token,
            platform,
        };
        self.call("/notifications/device", RequestOptions::post(&body)?)
            .await
    }
}

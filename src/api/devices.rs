use crate::client::{ApiClient, ClientError};
use crate::models::energy::{Device, DeviceId, DevicePayload, LiveReading};

impl ApiClient {
    pub fn list_devices(&self) -> Result<Vec<Device>, ClientError> {
        self.get_json("/devices", &[])
    }

    pub fn get_device(&self, id: DeviceId) -> Result<Device, ClientError> {
        self.get_json(&format!("/devices/{}", id), &[])
    }

    pub fn create_device(&self, payload: &DevicePayload) -> Result<Device, ClientError> {
        self.post_json("/devices", payload)
    }

    pub fn update_device(&self, id: DeviceId, payload: &DevicePayload) -> Result<Device, ClientError> {
        self.put_json(&format!("/devices/{}", id), payload)
    }

    pub fn delete_device(&self, id: DeviceId) -> Result<(), ClientError> {
        self.delete(&format!("/devices/{}", id))
    }

    /// Flip the device's power state server-side and return the updated device.
    pub fn toggle_device(&self, id: DeviceId) -> Result<Device, ClientError> {
        self.post_empty(&format!("/devices/{}/toggle", id))
    }

    /// Ask the backend for a synchronous read from the physical device.
    ///
    /// Devices without live credentials answer 400 with
    /// `{"error": "device not configured for live reads"}`; use
    /// [`ClientError::api_error`] to branch on it.
    pub fn test_device_connection(&self, id: DeviceId) -> Result<LiveReading, ClientError> {
        self.get_json(&format!("/devices/{}/read", id), &[])
    }
}

#[cfg(test)]
mod tests {
    use crate::client::testing::{client, client_with_token};
    use crate::models::energy::*;
    use http::{Method, StatusCode};
    use serde_json::json;

    fn device_json(id: i64, power_state: bool) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": 1,
            "name": "Test Device",
            "status": "offline",
            "power_state": power_state,
            "created_at": "2025-03-01T08:00:00Z",
        })
    }

    #[test]
    fn test_connection_hits_read_endpoint_once() {
        let (client, mock) = client_with_token("tok");
        mock.respond(200, json!({"power": 150.5}));

        let reading = client.test_device_connection(DeviceId(123)).unwrap();

        assert_eq!(reading, LiveReading { power: 150.5 });
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].path, "/devices/123/read");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn test_connection_preserves_not_configured_error() {
        let (client, mock) = client();
        mock.respond(400, json!({"error": "device not configured for live reads"}));

        let err = client.test_device_connection(DeviceId(1)).unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.api_error(), Some("device not configured for live reads"));
    }

    #[test]
    fn test_connection_preserves_unauthorized_error() {
        let (client, mock) = client();
        mock.respond(401, json!({"error": "unauthorized"}));

        let err = client.test_device_connection(DeviceId(1)).unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.api_error(), Some("unauthorized"));
    }

    #[test]
    fn crud_paths_and_bodies() {
        let (client, mock) = client();
        mock.respond(200, json!([device_json(1, false), device_json(2, true)]))
            .respond(200, device_json(2, true))
            .respond(201, device_json(3, false))
            .respond(200, device_json(3, false))
            .respond_empty(204);

        assert_eq!(client.list_devices().unwrap().len(), 2);
        assert_eq!(client.get_device(DeviceId(2)).unwrap().power_state, Some(true));
        let created = client
            .create_device(&DevicePayload {
                room: Some("Kitchen".to_string()),
                ..DevicePayload::named("Kettle")
            })
            .unwrap();
        assert_eq!(created.id, DeviceId(3));
        client
            .update_device(
                DeviceId(3),
                &DevicePayload {
                    status: Some(DeviceStatus::Online),
                    ..Default::default()
                },
            )
            .unwrap();
        client.delete_device(DeviceId(3)).unwrap();

        let calls: Vec<_> = mock
            .requests()
            .into_iter()
            .map(|r| (r.method, r.path, r.body))
            .collect();
        assert_eq!(
            calls,
            vec![
                (Method::GET, "/devices".to_string(), None),
                (Method::GET, "/devices/2".to_string(), None),
                (
                    Method::POST,
                    "/devices".to_string(),
                    Some(json!({"name": "Kettle", "room": "Kitchen"}))
                ),
                (Method::PUT, "/devices/3".to_string(), Some(json!({"status": "online"}))),
                (Method::DELETE, "/devices/3".to_string(), None),
            ]
        );
    }

    #[test]
    fn toggle_posts_without_body_and_returns_device() {
        let (client, mock) = client();
        mock.respond(200, device_json(5, true));

        let device = client.toggle_device(DeviceId(5)).unwrap();

        assert_eq!(device.power_state, Some(true));
        let req = mock.last();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "/devices/5/toggle");
        assert_eq!(req.body, None);
    }
}

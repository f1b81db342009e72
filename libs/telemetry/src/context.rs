#[derive(Debug, Clone)]
pub struct TelemetryLabels {
    pub platform: String,
    pub channel: Option<String>,
    pub msg_id: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl TelemetryLabels {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            channel: None,
            msg_id: None,
            extra: Vec::new(),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_msg_id(mut self, msg_id: impl Into<String>) -> Self {
        self.msg_id = Some(msg_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Label set suitable for metrics. Channel and message ids are left out to keep
    /// cardinality bounded.
    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = Vec::with_capacity(1 + self.extra.len());
        tags.push(("platform".into(), self.platform.clone()));
        for (key, value) in &self.extra {
            tags.push((key.clone(), value.clone()));
        }
        tags
    }
}

#[derive(Debug, Clone)]
pub struct MessageContext {
    pub labels: TelemetryLabels,
}

impl MessageContext {
    pub fn new(labels: TelemetryLabels) -> Self {
        Self { labels }
    }
}

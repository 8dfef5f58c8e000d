// src/server/render.rs
// Dashboard page. Built from a snapshot so it can be tested without a server.
use askama::Template;

use crate::health::{ServiceDescriptor, ServiceStatus};

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub title: &'a str,
    pub cards: Vec<StatusCard<'a>>,
    pub links: Vec<ServiceLink<'a>>,
}

pub struct StatusCard<'a> {
    pub name: &'a str,
    pub class: &'static str,
    pub label: &'a str,
    pub checked: String,
}

pub struct ServiceLink<'a> {
    pub href: &'a str,
    pub text: String,
}

impl<'a> StatusCard<'a> {
    fn new(status: &'a ServiceStatus) -> Self {
        Self {
            name: &status.service_name,
            class: if status.is_healthy() {
                "status-up"
            } else {
                "status-down"
            },
            label: status.label(),
            checked: status
                .checked_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

impl<'a> DashboardTemplate<'a> {
    /// Docs links first, then one health-check link per service.
    pub fn new(
        title: &'a str,
        descriptors: &'a [ServiceDescriptor],
        statuses: &'a [ServiceStatus],
    ) -> Self {
        let docs = descriptors.iter().filter_map(|d| {
            d.docs_url.as_ref().map(|url| ServiceLink {
                href: url.as_str(),
                text: format!("{} API Docs", d.name),
            })
        });
        let health = descriptors.iter().map(|d| ServiceLink {
            href: d.probe_url.as_str(),
            text: format!("{} Health Check", d.name),
        });

        Self {
            title,
            cards: statuses.iter().map(StatusCard::new).collect(),
            links: docs.chain(health).collect(),
        }
    }
}

pub fn render_page(
    title: &str,
    descriptors: &[ServiceDescriptor],
    statuses: &[ServiceStatus],
) -> askama::Result<String> {
    DashboardTemplate::new(title, descriptors, statuses).render()
}

//! Delivery timeline derived from an order's status and date.
//!
//! Nothing here is persisted: the same `(status, order_date)` always yields the same events.

use async_graphql::SimpleObject;
use chrono::{DateTime, Duration, Utc};

use crate::entity::enums::OrderStatus;

#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct TrackingEvent {
    pub status: OrderStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub location: Option<String>,
}

struct Milestone {
    status: OrderStatus,
    offset_hours: i64,
    message: &'static str,
    location: Option<&'static str>,
}

const PLACED: Milestone = Milestone {
    status: OrderStatus::Pending,
    offset_hours: 0,
    message: "Order placed",
    location: None,
};

const FULFILMENT: [Milestone; 4] = [
    Milestone {
        status: OrderStatus::Confirmed,
        offset_hours: 1,
        message: "Order confirmed by the seller",
        location: None,
    },
    Milestone {
        status: OrderStatus::Processing,
        offset_hours: 2,
        message: "Order is being prepared",
        location: Some("Fulfillment center"),
    },
    Milestone {
        status: OrderStatus::Shipped,
        offset_hours: 24,
        message: "Order has been shipped",
        location: Some("Distribution hub"),
    },
    Milestone {
        status: OrderStatus::Delivered,
        offset_hours: 72,
        message: "Order delivered",
        location: Some("Delivery address"),
    },
];

const CANCELLED: Milestone = Milestone {
    status: OrderStatus::Cancelled,
    offset_hours: 1,
    message: "Order cancelled",
    location: None,
};

const RETURNED: Milestone = Milestone {
    status: OrderStatus::Returned,
    offset_hours: 168,
    message: "Order returned",
    location: Some("Returns center"),
};

pub fn project(status: OrderStatus, order_date: DateTime<Utc>) -> Vec<TrackingEvent> {
    let reached = match status {
        OrderStatus::Returned => OrderStatus::Delivered.fulfilment_rank(),
        other => other.fulfilment_rank(),
    };

    let mut events = vec![event(&PLACED, order_date)];
    if let Some(rank) = reached {
        events.extend(
            FULFILMENT
                .iter()
                .filter(|m| m.status.fulfilment_rank().is_some_and(|r| r <= rank))
                .map(|m| event(m, order_date)),
        );
    }

    match status {
        OrderStatus::Cancelled => events.push(event(&CANCELLED, order_date)),
        OrderStatus::Returned => events.push(event(&RETURNED, order_date)),
        _ => {}
    }

    events
}

fn event(milestone: &Milestone, order_date: DateTime<Utc>) -> TrackingEvent {
    TrackingEvent {
        status: milestone.status,
        message: milestone.message.to_string(),
        timestamp: order_date + Duration::hours(milestone.offset_hours),
        location: milestone.location.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn placed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    fn statuses(events: &[TrackingEvent]) -> Vec<OrderStatus> {
        events.iter().map(|e| e.status).collect()
    }

    #[test]
    fn pending_order_only_shows_placement() {
        let events = project(OrderStatus::Pending, placed_at());
        assert_eq!(statuses(&events), vec![OrderStatus::Pending]);
        assert_eq!(events[0].timestamp, placed_at());
    }

    #[test]
    fn delivered_order_has_full_timeline_with_fixed_offsets() {
        let events = project(OrderStatus::Delivered, placed_at());
        assert_eq!(
            statuses(&events),
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
            ]
        );
        let offsets: Vec<i64> = events
            .iter()
            .map(|e| (e.timestamp - placed_at()).num_hours())
            .collect();
        assert_eq!(offsets, vec![0, 1, 2, 24, 72]);
    }

    #[test]
    fn projection_is_deterministic() {
        let first = project(OrderStatus::Shipped, placed_at());
        let second = project(OrderStatus::Shipped, placed_at());
        assert_eq!(first, second);
    }

    #[test]
    fn advancing_status_grows_a_prefix() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ];
        let mut previous: Vec<TrackingEvent> = Vec::new();
        for status in path {
            let events = project(status, placed_at());
            assert_eq!(events.len(), previous.len() + 1);
            assert_eq!(&events[..previous.len()], previous.as_slice());
            assert!(events.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            previous = events;
        }
    }

    #[test]
    fn cancelled_order_ends_with_cancellation() {
        let events = project(OrderStatus::Cancelled, placed_at());
        assert_eq!(
            statuses(&events),
            vec![OrderStatus::Pending, OrderStatus::Cancelled]
        );
    }

    #[test]
    fn returned_order_keeps_delivery_history() {
        let events = project(OrderStatus::Returned, placed_at());
        assert_eq!(events.len(), 6);
        assert_eq!(events[4].status, OrderStatus::Delivered);
        assert_eq!(events[5].status, OrderStatus::Returned);
        assert!(events[5].timestamp > events[4].timestamp);
    }
}

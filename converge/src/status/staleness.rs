use std::time::Duration;

use chrono::{DateTime, Utc};
use convergeresource::condition::{error_condition, ready_condition, Condition, CONDITION_READY};
use humantime::format_duration;

use crate::utils::types::Clock;

use super::{
    CachedConnection, REASON_CONNECTION_NOT_FOUND, REASON_CONNECTION_NOT_READY,
    REASON_CONNECTION_READY, REASON_LAST_PROBE_EXCEEDED,
};

pub const ERR_MSG_CONNECTION_NOT_FOUND: &str = "the cluster connection was not found";
pub const ERR_MSG_LAST_PROBE_EXCEEDED: &str =
    "exceeded the maximum duration since the last probe";

/// Derive the Ready condition set for a cached connection from its last
/// known health signal and the probing time budget (period + timeout).
///
/// Total over its inputs: every combination maps to exactly one condition,
/// checked in priority order. Never raises; a budget that cannot be
/// represented degrades to an error condition.
pub fn connection_conditions<F>(
    get_connection: F,
    period: Duration,
    timeout: Duration,
    clock: &dyn Clock,
) -> Vec<Condition>
where
    F: FnOnce() -> Option<CachedConnection>,
{
    let Some(connection) = get_connection() else {
        return vec![error_condition(
            REASON_CONNECTION_NOT_FOUND,
            ERR_MSG_CONNECTION_NOT_FOUND,
        )];
    };

    if !connection.status.is_ready() {
        let message = connection
            .status
            .conditions
            .iter()
            .filter(|c| c.r#type == CONDITION_READY)
            .find_map(|c| c.message.clone().filter(|m| !m.is_empty()))
            .unwrap_or_else(|| "the cluster connection is not ready".to_string());
        return vec![error_condition(REASON_CONNECTION_NOT_READY, message)];
    }

    let last_probe = connection
        .status
        .conditions
        .iter()
        .filter(|c| c.r#type == CONDITION_READY)
        .find_map(|c| c.last_probe_time.clone());
    let Some(last_probe) = last_probe else {
        return vec![error_condition(
            REASON_CONNECTION_NOT_READY,
            "the time of the last probe could not be determined",
        )];
    };

    let max_duration = period + timeout;
    let Ok(budget) = chrono::Duration::from_std(max_duration) else {
        return vec![error_condition(
            REASON_CONNECTION_NOT_READY,
            "the maximum duration since the last probe could not be determined - \
             check the configured health check period and timeout",
        )];
    };

    let now: DateTime<Utc> = clock.now().into();
    if now > last_probe.0 + budget {
        let message = format!(
            "{}: {}",
            ERR_MSG_LAST_PROBE_EXCEEDED,
            format_duration(max_duration)
        );
        return vec![error_condition(REASON_LAST_PROBE_EXCEEDED, message)];
    }

    vec![ready_condition(REASON_CONNECTION_READY)]
}

#[cfg(test)]
mod tests {
    use convergeresource::condition::{STATUS_FALSE, STATUS_TRUE};
    use convergeresource::connection::ClusterConnectionStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    use crate::utils::clock::FakeClock;

    use super::*;

    const PERIOD: Duration = Duration::from_secs(60);
    const TIMEOUT: Duration = Duration::from_secs(60);

    fn ready_probed(clock: &FakeClock, probe_age: Option<Duration>) -> CachedConnection {
        let last_probe_time = probe_age.map(|age| {
            let now: DateTime<Utc> = clock.now().into();
            Time(now - chrono::Duration::from_std(age).unwrap())
        });
        CachedConnection {
            name: "member-1".into(),
            status: ClusterConnectionStatus {
                conditions: vec![Condition {
                    r#type: CONDITION_READY.into(),
                    status: STATUS_TRUE.into(),
                    reason: None,
                    message: None,
                    last_transition_time: None,
                    last_probe_time,
                }],
            },
        }
    }

    #[test]
    fn missing_connection() {
        let clock = FakeClock::new();
        let conditions = connection_conditions(|| None, PERIOD, TIMEOUT, &clock);

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, STATUS_FALSE);
        assert_eq!(
            conditions[0].reason.as_deref(),
            Some(REASON_CONNECTION_NOT_FOUND)
        );
        assert_eq!(
            conditions[0].message.as_deref(),
            Some(ERR_MSG_CONNECTION_NOT_FOUND)
        );
    }

    #[test]
    fn not_ready_connection_surfaces_the_probe_message() {
        let clock = FakeClock::new();
        let connection = CachedConnection {
            name: "member-1".into(),
            status: ClusterConnectionStatus {
                conditions: vec![Condition {
                    r#type: CONDITION_READY.into(),
                    status: STATUS_FALSE.into(),
                    reason: None,
                    message: Some("boom".into()),
                    last_transition_time: None,
                    last_probe_time: None,
                }],
            },
        };

        let conditions = connection_conditions(|| Some(connection), PERIOD, TIMEOUT, &clock);

        assert_eq!(conditions.len(), 1);
        assert_eq!(
            conditions[0].reason.as_deref(),
            Some(REASON_CONNECTION_NOT_READY)
        );
        assert_eq!(conditions[0].message.as_deref(), Some("boom"));
    }

    #[test]
    fn not_ready_connection_without_message_gets_a_generic_one() {
        let clock = FakeClock::new();
        let connection = CachedConnection {
            name: "member-1".into(),
            status: ClusterConnectionStatus { conditions: vec![] },
        };

        let conditions = connection_conditions(|| Some(connection), PERIOD, TIMEOUT, &clock);

        assert_eq!(
            conditions[0].message.as_deref(),
            Some("the cluster connection is not ready")
        );
    }

    #[test]
    fn ready_connection_without_a_probe_time() {
        let clock = FakeClock::new();
        let connection = ready_probed(&clock, None);

        let conditions = connection_conditions(|| Some(connection), PERIOD, TIMEOUT, &clock);

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, STATUS_FALSE);
        assert_eq!(
            conditions[0].message.as_deref(),
            Some("the time of the last probe could not be determined")
        );
    }

    #[test]
    fn stale_probe_exceeds_the_budget() {
        let clock = FakeClock::new();
        let connection = ready_probed(&clock, Some(Duration::from_secs(600)));

        let conditions = connection_conditions(|| Some(connection), PERIOD, TIMEOUT, &clock);

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, STATUS_FALSE);
        assert_eq!(
            conditions[0].reason.as_deref(),
            Some(REASON_LAST_PROBE_EXCEEDED)
        );
        let message = conditions[0].message.as_deref().unwrap();
        assert!(message.contains(ERR_MSG_LAST_PROBE_EXCEEDED));
        assert!(message.contains("2m"));
    }

    #[test]
    fn unrepresentable_budget_degrades_to_an_error_condition() {
        let clock = FakeClock::new();
        let connection = ready_probed(&clock, Some(Duration::from_secs(10)));

        let conditions = connection_conditions(
            || Some(connection),
            Duration::from_secs(u64::MAX / 2),
            Duration::ZERO,
            &clock,
        );

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, STATUS_FALSE);
        assert!(conditions[0]
            .message
            .as_deref()
            .unwrap()
            .contains("could not be determined"));
    }

    #[test]
    fn fresh_probe_is_ready() {
        let clock = FakeClock::new();
        let connection = ready_probed(&clock, Some(Duration::from_secs(10)));

        let conditions = connection_conditions(|| Some(connection), PERIOD, TIMEOUT, &clock);

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, STATUS_TRUE);
        assert_eq!(
            conditions[0].reason.as_deref(),
            Some(REASON_CONNECTION_READY)
        );
    }
}

//! Per-run record ceiling for unlicensed use

use crate::adapters::LicenseService;

/// Caps how many tokens one run may process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LicenseGate {
    limit: usize,
}

impl LicenseGate {
    /// Builds the gate from the license service, warning about an expired license
    pub fn from_service(service: &dyn LicenseService) -> Self {
        if service.is_expired() {
            tracing::warn!("License expired - please renew the license");
        }
        let limit = service.limit();
        tracing::debug!(
            demo = service.is_demo(),
            paid = service.is_paid(),
            limit,
            "License gate"
        );
        Self { limit }
    }

    /// Gate with an explicit limit
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    /// Gate that never trips
    pub fn unlimited() -> Self {
        Self { limit: usize::MAX }
    }

    /// Maximum number of tokens per run
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns true once `processed` tokens reach the limit
    pub fn exceeded(&self, processed: usize) -> bool {
        processed >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    struct StaticLicense {
        demo: bool,
        paid: bool,
        expired: bool,
        limit: usize,
    }

    impl LicenseService for StaticLicense {
        fn is_demo(&self) -> bool {
            self.demo
        }
        fn is_paid(&self) -> bool {
            self.paid
        }
        fn is_expired(&self) -> bool {
            self.expired
        }
        fn limit(&self) -> usize {
            self.limit
        }
    }

    #[test_case(0, false)]
    #[test_case(1, false)]
    #[test_case(2, true)]
    #[test_case(3, true)]
    fn test_exceeded_at_limit(processed: usize, expected: bool) {
        assert_eq!(LicenseGate::with_limit(2).exceeded(processed), expected);
    }

    #[test]
    fn test_from_service_uses_service_limit() {
        let demo = StaticLicense {
            demo: true,
            paid: false,
            expired: false,
            limit: 25,
        };
        assert_eq!(LicenseGate::from_service(&demo).limit(), 25);

        let expired_paid = StaticLicense {
            demo: false,
            paid: true,
            expired: true,
            limit: usize::MAX,
        };
        let gate = LicenseGate::from_service(&expired_paid);
        assert!(!gate.exceeded(1_000_000));
    }

    #[test]
    fn test_unlimited_never_trips() {
        assert!(!LicenseGate::unlimited().exceeded(usize::MAX - 1));
    }
}

//! Trading-session clock. Gates entries only; exits are never gated.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use kite_bridge_core::{ConfigError, SessionConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketClock {
    open: NaiveTime,
    close: NaiveTime,
    /// `None` follows the process time zone.
    offset: Option<FixedOffset>,
}

impl MarketClock {
    #[must_use]
    pub const fn new(open: NaiveTime, close: NaiveTime, offset: Option<FixedOffset>) -> Self {
        Self {
            open,
            close,
            offset,
        }
    }

    /// # Errors
    /// Returns an error for unparsable session times or offsets.
    pub fn from_config(session: &SessionConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            session.open_time()?,
            session.close_time()?,
            session.utc_offset()?,
        ))
    }

    fn local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match self.offset {
            Some(offset) => now.with_timezone(&offset).naive_local(),
            None => now.with_timezone(&Local).naive_local(),
        }
    }

    /// Whether `now` falls in `[open, close]`, compared at minute
    /// resolution: with close 15:29 the whole minute 15:29:xx is open.
    #[must_use]
    pub fn is_session_open(&self, now: DateTime<Utc>) -> bool {
        let local = self.local(now);
        let minute = NaiveTime::from_hms_opt(local.hour(), local.minute(), 0).unwrap_or(local.time());
        self.open <= minute && minute <= self.close
    }

    /// Calendar date in the session's time zone.
    #[must_use]
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local(now).date()
    }
}

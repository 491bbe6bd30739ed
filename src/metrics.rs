//! Business targets derived from a predicted vehicle count.

use serde::Serialize;

use crate::calendar::CalendarContext;

/// Site-specific conversion ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SiteProfile {
    /// Coral Springs: fixed member share, no full-service tier.
    CoralSprings,
    /// Margate: weekend member bonus and a full-service estimate.
    Margate,
}

impl SiteProfile {
    /// Profile for a normalized site name, if the site has one.
    pub fn for_site(name: &str) -> Option<Self> {
        match name {
            "Coral Springs" => Some(Self::CoralSprings),
            "Margate" => Some(Self::Margate),
            _ => None,
        }
    }

    /// Share of predicted cars expected to be members.
    pub fn member_share(&self, calendar: &CalendarContext) -> f64 {
        match self {
            Self::CoralSprings => 0.70,
            Self::Margate => {
                let weekend_bonus = if calendar.day_of_week >= 5 { 0.05 } else { 0.0 };
                0.25 + weekend_bonus
            }
        }
    }

    /// Full-service wash share, for sites that offer it.
    ///
    /// Friday already uses the weekend rate here while the member bonus
    /// above starts on Saturday.
    pub fn full_service_share(&self, calendar: &CalendarContext) -> Option<f64> {
        match self {
            Self::CoralSprings => None,
            Self::Margate => Some(if calendar.day_of_week < 4 { 0.075 } else { 0.10 }),
        }
    }
}

/// Greeter conversion targets for the two shifts plus the supervisor remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GreeterSplit {
    /// Target for each of the opening and closing teams
    pub per_shift: f64,
    pub supervisor: f64,
}

impl GreeterSplit {
    pub fn from_conversion(conversion: f64) -> Self {
        Self {
            per_shift: (conversion / 2.0).floor().ceil(),
            supervisor: conversion.rem_euclid(2.0).ceil(),
        }
    }
}

/// Everything derived from one prediction. Unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub predicted_count: f64,
    pub members: f64,
    pub conversion_goal: f64,
    /// New members per hour the greeters should aim for
    pub greeter_hourly_target: f64,
    pub full_service: Option<f64>,
    pub greeter_split: GreeterSplit,
}

/// Derive the business targets for a site-day.
pub fn derive(predicted_count: f64, calendar: &CalendarContext, profile: SiteProfile) -> Metrics {
    let members = predicted_count * profile.member_share(calendar);
    let conversion_goal = members * 0.10;
    // The count is truncated to whole cars before the full-service share is applied
    let full_service = profile
        .full_service_share(calendar)
        .map(|share| predicted_count.trunc() * share);

    Metrics {
        predicted_count,
        members,
        conversion_goal,
        greeter_hourly_target: conversion_goal / 10.0,
        full_service,
        greeter_split: GreeterSplit::from_conversion(conversion_goal),
    }
}

use tracing::debug;

use super::*;

impl<C: CalendarService> SajuEngine<C> {
    /// Computes the four pillars for a resolved birth instant.
    pub fn calculate_chart(&self, instant: &SolarInstant) -> Result<Chart> {
        let calendar = self.calendar();

        let year = calendar.exact_year_ganzhi(instant)?;
        let month = calendar.exact_month_ganzhi(instant)?;
        let day = calendar.exact_day_ganzhi(instant)?;
        let hour = calendar.hour_ganzhi(instant, day.stem)?;

        let chart = Chart::new(year, month, day, hour);
        debug!(chart = %chart, "pillars calculated");
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup() -> SajuEngine<EphemerisCalendar> {
        SajuEngine::new(EphemerisCalendar, EngineConfig::default())
    }

    fn chart_at(engine: &SajuEngine<EphemerisCalendar>, y: i32, m: u32, d: u32, h: u32, min: u32) -> Chart {
        let local = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap();
        engine
            .calculate_chart(&SolarInstant::new(local, 9 * 60))
            .unwrap()
    }

    #[test]
    fn test_reference_chart() {
        let engine = setup();
        let chart = chart_at(&engine, 1990, 5, 15, 14, 30);
        assert_eq!(chart.to_string(), "庚午 辛巳 庚辰 癸未");
        assert_eq!(chart.year.element, Element::Metal);
        assert_eq!(chart.hour.element, Element::Water);
    }

    #[test]
    fn test_start_of_spring_boundary() {
        let engine = setup();
        let before = chart_at(&engine, 1990, 2, 3, 12, 0);
        let after = chart_at(&engine, 1990, 2, 5, 12, 0);
        assert_eq!(before.year.ganzhi().to_string(), "己巳");
        assert_eq!(after.year.ganzhi().to_string(), "庚午");
    }

    #[test]
    fn test_late_evening_rolls_day() {
        let engine = setup();
        let before = chart_at(&engine, 1990, 5, 15, 22, 50);
        let after = chart_at(&engine, 1990, 5, 15, 23, 10);

        assert_eq!(before.hour.branch, Branch::Hai);
        assert_eq!(before.day.ganzhi().to_string(), "庚辰");
        assert_eq!(before.hour.ganzhi().to_string(), "丁亥");

        assert_eq!(after.hour.branch, Branch::Zi);
        assert_eq!(after.day.ganzhi().to_string(), "辛巳");
        assert_eq!(after.hour.ganzhi().to_string(), "戊子");
    }
}

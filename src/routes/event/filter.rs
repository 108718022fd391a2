use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;

/// 固定的活动分类
pub const CATEGORIES: [&str; 14] = [
    "Arte, Cultura e Lazer",
    "Congressos e Palestras",
    "Cursos e Workshops",
    "Esporte",
    "Festas e Shows",
    "Gastronomia",
    "Games e Geek",
    "Grátis",
    "Infantil",
    "Moda e Beleza",
    "Passeios e Tours",
    "Religião e Espiritualidade",
    "Saúde e Bem-Estar",
    "Teatros e Espetáculos",
];

pub fn is_known_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

const DEFAULT_PAGE_SIZE: i64 = 24;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
    ThisMonth,
}

impl FromStr for Period {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hoje" => Ok(Period::Today),
            "amanha" => Ok(Period::Tomorrow),
            "esta-semana" => Ok(Period::ThisWeek),
            "proxima-semana" => Ok(Period::NextWeek),
            "este-mes" => Ok(Period::ThisMonth),
            _ => Err(()),
        }
    }
}

/// 本周最后一天（周六）
fn end_of_week(today: NaiveDate) -> NaiveDate {
    let days_until_saturday = 6 - today.weekday().num_days_from_sunday() as i64;
    today + Duration::days(days_until_saturday)
}

fn end_of_month(today: NaiveDate) -> NaiveDate {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(today)
}

impl Period {
    /// 按天比较，`today` 由调用方传入
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Period::Today => date == today,
            Period::Tomorrow => date == today + Duration::days(1),
            Period::ThisWeek => date >= today && date <= end_of_week(today),
            Period::NextWeek => {
                let start = end_of_week(today) + Duration::days(1);
                date >= start && date <= start + Duration::days(6)
            }
            Period::ThisMonth => date >= today && date <= end_of_month(today),
        }
    }
}

pub trait StartsOn {
    fn starts_on(&self) -> NaiveDate;
}

pub fn filter_by_period<T: StartsOn>(events: Vec<T>, period: Period, today: NaiveDate) -> Vec<T> {
    events
        .into_iter()
        .filter(|event| period.contains(event.starts_on(), today))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceClass {
    Free,
    Paid,
    Any,
}

impl PriceClass {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("gratis") => PriceClass::Free,
            Some("pago") => PriceClass::Paid,
            _ => PriceClass::Any,
        }
    }

    /// 没有票档的活动算作免费
    pub fn matches(&self, prices: &[f64]) -> bool {
        match self {
            PriceClass::Any => true,
            PriceClass::Free => prices.is_empty() || prices.iter().any(|p| *p == 0.0),
            PriceClass::Paid => prices.iter().any(|p| *p > 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueType {
    Online,
    InPerson,
    Any,
}

impl VenueType {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("online") => VenueType::Online,
            Some("presencial") => VenueType::InPerson,
            _ => VenueType::Any,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicEventQuery {
    pub categoria: Option<String>,
    pub preco: Option<String>,
    pub tipo: Option<String>,
    pub localizacao: Option<String>,
    pub pagina: Option<i64>,
    pub limite: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublicEventFilters {
    pub categories: Vec<String>,
    pub price: PriceClass,
    pub venue: VenueType,
    pub city: Option<String>,
    pub page: i64,
    pub page_size: i64,
}

impl From<PublicEventQuery> for PublicEventFilters {
    fn from(query: PublicEventQuery) -> Self {
        let categories = query
            .categoria
            .as_deref()
            .map(|raw| {
                raw.split([',', '|'])
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            categories,
            price: PriceClass::parse(query.preco.as_deref()),
            venue: VenueType::parse(query.tipo.as_deref()),
            city: query
                .localizacao
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            page: query.pagina.unwrap_or(1).max(1),
            page_size: query
                .limite
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl PublicEventFilters {
    /// 没有任何筛选条件时首页随机排序
    pub fn has_active_filters(&self) -> bool {
        !self.categories.is_empty()
            || self.price != PriceClass::Any
            || self.venue != VenueType::Any
            || self.city.is_some()
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.page_size - 1) / self.page_size
    }
}

/// 转义 LIKE 通配符后包成子串匹配模式
pub fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dated(NaiveDate);

    impl StartsOn for Dated {
        fn starts_on(&self) -> NaiveDate {
            self.0
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn today_includes_only_same_day() {
        // 2026-10-14 是周三
        let today = date(2026, 10, 14);
        let events = vec![Dated(today), Dated(date(2026, 10, 15)), Dated(date(2026, 10, 13))];

        let result = filter_by_period(events, Period::Today, today);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, today);
    }

    #[test]
    fn tomorrow_is_exactly_one_day_ahead() {
        let today = date(2026, 10, 14);
        assert!(Period::Tomorrow.contains(date(2026, 10, 15), today));
        assert!(!Period::Tomorrow.contains(today, today));
    }

    #[test]
    fn this_week_runs_until_saturday() {
        let wednesday = date(2026, 10, 14);
        assert!(Period::ThisWeek.contains(wednesday, wednesday));
        assert!(Period::ThisWeek.contains(date(2026, 10, 17), wednesday));
        assert!(!Period::ThisWeek.contains(date(2026, 10, 18), wednesday));
        assert!(!Period::ThisWeek.contains(date(2026, 10, 13), wednesday));

        // 周六当天本周只剩一天
        let saturday = date(2026, 10, 17);
        assert!(Period::ThisWeek.contains(saturday, saturday));
        assert!(!Period::ThisWeek.contains(date(2026, 10, 18), saturday));
    }

    #[test]
    fn next_week_is_following_sunday_to_saturday() {
        let wednesday = date(2026, 10, 14);
        assert!(!Period::NextWeek.contains(date(2026, 10, 17), wednesday));
        assert!(Period::NextWeek.contains(date(2026, 10, 18), wednesday));
        assert!(Period::NextWeek.contains(date(2026, 10, 24), wednesday));
        assert!(!Period::NextWeek.contains(date(2026, 10, 25), wednesday));
    }

    #[test]
    fn this_month_handles_december_rollover() {
        let today = date(2026, 12, 20);
        assert!(Period::ThisMonth.contains(date(2026, 12, 31), today));
        assert!(!Period::ThisMonth.contains(date(2027, 1, 1), today));
        assert!(!Period::ThisMonth.contains(date(2026, 12, 19), today));
        assert_eq!(end_of_month(date(2028, 2, 3)), date(2028, 2, 29));
    }

    #[test]
    fn period_names_parse() {
        assert_eq!("hoje".parse(), Ok(Period::Today));
        assert_eq!("proxima-semana".parse(), Ok(Period::NextWeek));
        assert!("ontem".parse::<Period>().is_err());
    }

    #[test]
    fn empty_query_has_no_active_filters() {
        let filters = PublicEventFilters::from(PublicEventQuery::default());
        assert!(!filters.has_active_filters());
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_size, DEFAULT_PAGE_SIZE);

        // "qualquer" 等同于未设置
        let filters = PublicEventFilters::from(PublicEventQuery {
            preco: Some("qualquer".into()),
            tipo: Some("qualquer".into()),
            localizacao: Some("  ".into()),
            categoria: Some("".into()),
            ..Default::default()
        });
        assert!(!filters.has_active_filters());
    }

    #[test]
    fn categories_split_on_comma_and_pipe() {
        let filters = PublicEventFilters::from(PublicEventQuery {
            categoria: Some("Esporte|Gastronomia, Infantil".into()),
            ..Default::default()
        });
        assert_eq!(filters.categories, vec!["Esporte", "Gastronomia", "Infantil"]);
        assert!(filters.has_active_filters());
    }

    #[test]
    fn pagination_is_clamped() {
        let filters = PublicEventFilters::from(PublicEventQuery {
            pagina: Some(0),
            limite: Some(1000),
            ..Default::default()
        });
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_size, MAX_PAGE_SIZE);
        assert_eq!(filters.offset(), 0);

        let filters = PublicEventFilters::from(PublicEventQuery {
            pagina: Some(3),
            limite: Some(10),
            ..Default::default()
        });
        assert_eq!(filters.offset(), 20);
        assert_eq!(filters.total_pages(21), 3);
        assert_eq!(filters.total_pages(0), 0);
    }

    #[test]
    fn price_class_matches_ticket_prices() {
        assert!(PriceClass::Free.matches(&[]));
        assert!(PriceClass::Free.matches(&[0.0, 50.0]));
        assert!(!PriceClass::Free.matches(&[10.0]));
        assert!(PriceClass::Paid.matches(&[0.0, 50.0]));
        assert!(!PriceClass::Paid.matches(&[]));
        assert!(PriceClass::Any.matches(&[]));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("São"), "%São%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn known_categories() {
        assert!(is_known_category("Esporte"));
        assert!(!is_known_category("esporte"));
        assert_eq!(CATEGORIES.len(), 14);
    }
}

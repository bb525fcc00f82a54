use std::collections::HashSet;

use time::{Date, OffsetDateTime};
use tracing::{debug, warn};

use crate::client::api::{ClientError, NutritionApi};
use crate::nutrition::dto::{
    CreateLogRequest, ListEnvelope, LogListQuery, MealRequest, NutritionLogDto,
    WaterUpdateRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Daily,
    Meals,
    Water,
    Stats,
    Planner,
    Goals,
}

impl Tab {
    /// Daily, meals and water show the selected day's log; the other tabs
    /// render standalone views and never trigger a log fetch.
    pub fn needs_log(self) -> bool {
        matches!(self, Tab::Daily | Tab::Meals | Tab::Water)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// Transient user-facing notification, the toast analog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// What the active tab should render right now. Exhaustive by construction:
/// a renderer has to handle every state.
#[derive(Debug)]
pub enum TabView<'a> {
    Loading,
    NoData { date: Date },
    Daily { log: &'a NutritionLogDto },
    Meals { log: &'a NutritionLogDto, show_form: bool },
    Water { log: &'a NutritionLogDto },
    Stats,
    Planner,
    Goals,
}

/// Handle for applying a fetch result. Carries the generation the fetch was
/// started under; results from a superseded generation are discarded without
/// touching state.
#[derive(Debug, Clone, Copy)]
pub struct FetchTicket {
    generation: u64,
    date: Date,
}

/// State of the nutrition day view: selected date, active tab, the one log
/// the view holds at a time, and the guards around log creation and water
/// updates. The server copy is authoritative; every mutation replaces the
/// local log wholesale with the server's response.
pub struct NutritionView<A> {
    api: A,
    date: Date,
    tab: Tab,
    log: Option<NutritionLogDto>,
    loading: bool,
    show_form: bool,
    /// Per-date idempotency keys: a date in this set has an auto-create
    /// attempt outstanding (or failed), so no second create is issued for it.
    pending_creates: HashSet<Date>,
    /// Last water value the server confirmed. Restored explicitly when a
    /// water update fails.
    confirmed_water: Option<i32>,
    generation: u64,
    notices: Vec<Notice>,
}

impl<A: NutritionApi> NutritionView<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            date: Self::today(),
            tab: Tab::Daily,
            log: None,
            loading: true,
            show_form: false,
            pending_creates: HashSet::new(),
            confirmed_water: None,
            generation: 0,
            notices: Vec::new(),
        }
    }

    fn today() -> Date {
        OffsetDateTime::now_utc().date()
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn log(&self) -> Option<&NutritionLogDto> {
        self.log.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_show_form(&mut self, show: bool) {
        self.show_form = show;
    }

    /// Drain queued notifications for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// Changing the date supersedes any fetch still in flight.
    pub fn select_date(&mut self, date: Date) {
        if date != self.date {
            self.date = date;
            self.generation += 1;
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if tab != self.tab {
            self.tab = tab;
            self.generation += 1;
        }
    }

    /// Start a fetch for the selected date. The returned ticket must be
    /// passed back to [`apply_fetch`] together with the result.
    ///
    /// [`apply_fetch`]: NutritionView::apply_fetch
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.loading = true;
        FetchTicket {
            generation: self.generation,
            date: self.date,
        }
    }

    /// Fetch the log for the selected date, if the active tab shows one.
    /// Auto-creates today's log when none exists yet.
    pub async fn refresh(&mut self) {
        if !self.tab.needs_log() {
            return;
        }
        let ticket = self.begin_fetch();
        let query = LogListQuery {
            start_date: Some(ticket.date),
            end_date: Some(ticket.date),
            limit: 1,
            offset: 0,
        };
        let result = self.api.list_logs(&query).await;
        self.apply_fetch(ticket, result).await;
    }

    pub async fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<ListEnvelope<NutritionLogDto>, ClientError>,
    ) {
        if ticket.generation != self.generation {
            debug!(date = %ticket.date, "discarding stale fetch result");
            return;
        }
        self.loading = false;

        match result {
            Ok(envelope) if envelope.count > 0 => {
                let log = envelope.data.into_iter().next();
                if let Some(log) = log {
                    debug!(date = %ticket.date, log_id = %log.id, "log loaded");
                    self.pending_creates.remove(&ticket.date);
                    self.confirmed_water = Some(log.water_intake);
                    self.log = Some(log);
                }
            }
            Ok(_) => {
                self.log = None;
                self.maybe_create_today(ticket.date).await;
            }
            Err(err) => {
                warn!(date = %ticket.date, error = %err, "log fetch failed");
                self.log = None;
                let message = err.message_or("Failed to fetch nutrition log").to_string();
                self.notify(NoticeLevel::Error, message);
            }
        }
    }

    /// No log came back for the date. Auto-create applies to today only:
    /// future dates get an info notice, past dates stay empty silently.
    async fn maybe_create_today(&mut self, date: Date) {
        let today = Self::today();
        if date == today {
            if self.pending_creates.contains(&date) {
                debug!(%date, "create already attempted for this date");
                return;
            }
            self.pending_creates.insert(date);
            match self.request_create(date, 0).await {
                Ok(()) => {
                    self.notify(NoticeLevel::Success, "Nutrition log created successfully")
                }
                Err(err) => {
                    let message = err
                        .message_or("Failed to create nutrition log")
                        .to_string();
                    self.notify(NoticeLevel::Error, message);
                }
            }
        } else if date > today {
            self.notify(
                NoticeLevel::Info,
                "Cannot create nutrition log for future dates",
            );
        }
    }

    /// Issue the create request and store the server's log. Leaves the date
    /// in `pending_creates` on failure so a re-entrant fetch does not retry.
    async fn request_create(&mut self, date: Date, water_intake: i32) -> Result<(), ClientError> {
        let body = CreateLogRequest {
            date,
            meals: Vec::new(),
            water_intake,
        };
        let log = self.api.create_log(&body).await?;
        self.pending_creates.remove(&date);
        self.confirmed_water = Some(log.water_intake);
        self.log = Some(log);
        Ok(())
    }

    /// Manual create action, bound to the "Create Nutrition Log" affordance.
    pub async fn create_log(&mut self) {
        let date = self.date;
        if date > Self::today() {
            self.notify(
                NoticeLevel::Error,
                "Cannot create nutrition log for future dates",
            );
            return;
        }
        match self.request_create(date, 0).await {
            Ok(()) => self.notify(NoticeLevel::Success, "Nutrition log created successfully"),
            Err(err) => {
                let message = err
                    .message_or("Failed to create nutrition log")
                    .to_string();
                self.notify(NoticeLevel::Error, message);
            }
        }
    }

    /// Set water intake to an absolute amount. When no log exists for the
    /// date yet the server answers 404 and the day is created carrying the
    /// amount. On any other failure the last confirmed value is restored.
    pub async fn update_water(&mut self, amount: i32) {
        let date = self.date;
        let request = WaterUpdateRequest { date, amount };
        match self.api.update_water(&request).await {
            Ok(log) => {
                self.confirmed_water = Some(amount);
                match self.log.as_mut() {
                    Some(local) => local.water_intake = amount,
                    None => self.log = Some(log),
                }
                self.notify(NoticeLevel::Success, "Water intake updated");
            }
            Err(err) if err.is_not_found() => match self.request_create(date, amount).await {
                Ok(()) => self.notify(NoticeLevel::Success, "Water intake updated"),
                Err(create_err) => {
                    warn!(%date, error = %create_err, "water create fallback failed");
                    self.notify(NoticeLevel::Error, "Failed to update water intake");
                }
            },
            Err(err) => {
                warn!(%date, error = %err, "water update failed");
                if let (Some(local), Some(confirmed)) = (self.log.as_mut(), self.confirmed_water)
                {
                    local.water_intake = confirmed;
                }
                self.notify(NoticeLevel::Error, "Failed to update water intake");
            }
        }
    }

    pub async fn add_meal(&mut self, meal: MealRequest) {
        let Some(log_id) = self.log.as_ref().map(|l| l.id) else {
            self.notify(NoticeLevel::Error, "No nutrition log for this date");
            return;
        };
        match self.api.add_meal(log_id, &meal).await {
            Ok(log) => {
                self.confirmed_water = Some(log.water_intake);
                self.log = Some(log);
                self.show_form = false;
                self.notify(NoticeLevel::Success, "Meal added");
            }
            Err(err) => {
                let message = err.message_or("Failed to add meal").to_string();
                self.notify(NoticeLevel::Error, message);
            }
        }
    }

    pub async fn update_meal(&mut self, meal_id: uuid::Uuid, meal: MealRequest) {
        let Some(log_id) = self.log.as_ref().map(|l| l.id) else {
            self.notify(NoticeLevel::Error, "No nutrition log for this date");
            return;
        };
        match self.api.update_meal(log_id, meal_id, &meal).await {
            Ok(log) => {
                self.confirmed_water = Some(log.water_intake);
                self.log = Some(log);
                self.notify(NoticeLevel::Success, "Meal updated");
            }
            Err(err) => {
                let message = err.message_or("Failed to update meal").to_string();
                self.notify(NoticeLevel::Error, message);
            }
        }
    }

    pub async fn delete_meal(&mut self, meal_id: uuid::Uuid) {
        let Some(log_id) = self.log.as_ref().map(|l| l.id) else {
            self.notify(NoticeLevel::Error, "No nutrition log for this date");
            return;
        };
        match self.api.delete_meal(log_id, meal_id).await {
            Ok(log) => {
                self.confirmed_water = Some(log.water_intake);
                self.log = Some(log);
                self.notify(NoticeLevel::Success, "Meal removed");
            }
            Err(err) => {
                let message = err.message_or("Failed to delete meal").to_string();
                self.notify(NoticeLevel::Error, message);
            }
        }
    }

    pub fn view(&self) -> TabView<'_> {
        if self.loading && self.log.is_none() && self.tab.needs_log() {
            return TabView::Loading;
        }
        match self.tab {
            Tab::Daily => match &self.log {
                Some(log) => TabView::Daily { log },
                None => TabView::NoData { date: self.date },
            },
            Tab::Meals => match &self.log {
                Some(log) => TabView::Meals {
                    log,
                    show_form: self.show_form,
                },
                None => TabView::NoData { date: self.date },
            },
            Tab::Water => match &self.log {
                Some(log) => TabView::Water { log },
                None => TabView::NoData { date: self.date },
            },
            Tab::Stats => TabView::Stats,
            Tab::Planner => TabView::Planner,
            Tab::Goals => TabView::Goals,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::*;
    use crate::nutrition::dto::MealDto;

    fn make_log(date: Date, water: i32) -> NutritionLogDto {
        let now = OffsetDateTime::now_utc();
        NutritionLogDto {
            id: Uuid::new_v4(),
            date,
            meals: Vec::new(),
            water_intake: water,
            created_at: now,
            updated_at: now,
        }
    }

    #[derive(Default)]
    struct FakeApi {
        store: Mutex<HashMap<Date, NutritionLogDto>>,
        list_calls: AtomicUsize,
        create_calls: AtomicUsize,
        fail_creates: AtomicBool,
        fail_water: AtomicBool,
    }

    impl FakeApi {
        async fn seed(&self, log: NutritionLogDto) {
            self.store.lock().await.insert(log.date, log);
        }

        fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl NutritionApi for FakeApi {
        async fn list_logs(
            &self,
            query: &LogListQuery,
        ) -> Result<ListEnvelope<NutritionLogDto>, ClientError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let store = self.store.lock().await;
            let data: Vec<NutritionLogDto> = query
                .start_date
                .and_then(|d| store.get(&d).cloned())
                .into_iter()
                .collect();
            Ok(ListEnvelope {
                count: data.len(),
                data,
            })
        }

        async fn create_log(
            &self,
            body: &CreateLogRequest,
        ) -> Result<NutritionLogDto, ClientError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_creates.load(Ordering::SeqCst) {
                return Err(ClientError::api(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Some("Log limit reached".into()),
                ));
            }
            let mut store = self.store.lock().await;
            if store.contains_key(&body.date) {
                return Err(ClientError::api(
                    StatusCode::CONFLICT,
                    Some("Nutrition log already exists for this date".into()),
                ));
            }
            let log = make_log(body.date, body.water_intake);
            store.insert(body.date, log.clone());
            Ok(log)
        }

        async fn update_water(
            &self,
            body: &WaterUpdateRequest,
        ) -> Result<NutritionLogDto, ClientError> {
            if self.fail_water.load(Ordering::SeqCst) {
                return Err(ClientError::api(StatusCode::INTERNAL_SERVER_ERROR, None));
            }
            let mut store = self.store.lock().await;
            match store.get_mut(&body.date) {
                Some(log) => {
                    log.water_intake = body.amount;
                    Ok(log.clone())
                }
                None => Err(ClientError::api(
                    StatusCode::NOT_FOUND,
                    Some("No nutrition log exists for this date".into()),
                )),
            }
        }

        async fn add_meal(
            &self,
            log_id: Uuid,
            meal: &MealRequest,
        ) -> Result<NutritionLogDto, ClientError> {
            let mut store = self.store.lock().await;
            let log = store
                .values_mut()
                .find(|l| l.id == log_id)
                .ok_or_else(|| ClientError::api(StatusCode::NOT_FOUND, None))?;
            log.meals.push(MealDto {
                id: Uuid::new_v4(),
                name: meal.name.clone(),
                meal_type: meal.meal_type.clone(),
                calories: meal.calories,
                protein_g: meal.protein_g,
                carbs_g: meal.carbs_g,
                fat_g: meal.fat_g,
                created_at: OffsetDateTime::now_utc(),
            });
            Ok(log.clone())
        }

        async fn update_meal(
            &self,
            log_id: Uuid,
            meal_id: Uuid,
            meal: &MealRequest,
        ) -> Result<NutritionLogDto, ClientError> {
            let mut store = self.store.lock().await;
            let log = store
                .values_mut()
                .find(|l| l.id == log_id)
                .ok_or_else(|| ClientError::api(StatusCode::NOT_FOUND, None))?;
            let entry = log
                .meals
                .iter_mut()
                .find(|m| m.id == meal_id)
                .ok_or_else(|| ClientError::api(StatusCode::NOT_FOUND, None))?;
            entry.name = meal.name.clone();
            entry.calories = meal.calories;
            Ok(log.clone())
        }

        async fn delete_meal(
            &self,
            log_id: Uuid,
            meal_id: Uuid,
        ) -> Result<NutritionLogDto, ClientError> {
            let mut store = self.store.lock().await;
            let log = store
                .values_mut()
                .find(|l| l.id == log_id)
                .ok_or_else(|| ClientError::api(StatusCode::NOT_FOUND, None))?;
            log.meals.retain(|m| m.id != meal_id);
            Ok(log.clone())
        }
    }

    fn view_with(api: &Arc<FakeApi>) -> NutritionView<Arc<FakeApi>> {
        NutritionView::new(Arc::clone(api))
    }

    fn today() -> Date {
        OffsetDateTime::now_utc().date()
    }

    #[tokio::test]
    async fn refresh_creates_todays_log_exactly_once() {
        let api = Arc::new(FakeApi::default());
        let mut view = view_with(&api);

        view.refresh().await;
        let log = view.log().expect("log created for today");
        assert_eq!(log.water_intake, 0);
        assert!(log.meals.is_empty());
        assert_eq!(api.create_calls(), 1);

        let notices = view.take_notices();
        assert!(notices
            .iter()
            .any(|n| n.level == NoticeLevel::Success
                && n.message == "Nutrition log created successfully"));

        // A rapid second refresh finds the stored log and must not create
        // another one.
        view.refresh().await;
        assert_eq!(api.create_calls(), 1);
    }

    #[tokio::test]
    async fn failed_create_is_not_retried_on_refresh() {
        let api = Arc::new(FakeApi::default());
        api.fail_creates.store(true, Ordering::SeqCst);
        let mut view = view_with(&api);

        view.refresh().await;
        assert_eq!(api.create_calls(), 1);
        let notices = view.take_notices();
        assert!(notices
            .iter()
            .any(|n| n.level == NoticeLevel::Error && n.message == "Log limit reached"));

        // The date stays marked as attempted; no duplicate request.
        view.refresh().await;
        assert_eq!(api.create_calls(), 1);
    }

    #[tokio::test]
    async fn future_date_notifies_and_issues_no_create() {
        let api = Arc::new(FakeApi::default());
        let mut view = view_with(&api);
        view.select_date(today().next_day().unwrap());

        view.refresh().await;
        assert_eq!(api.create_calls(), 0);
        assert!(view.log().is_none());
        let notices = view.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert_eq!(
            notices[0].message,
            "Cannot create nutrition log for future dates"
        );
    }

    #[tokio::test]
    async fn past_date_without_log_stays_silent() {
        let api = Arc::new(FakeApi::default());
        let mut view = view_with(&api);
        view.select_date(today().previous_day().unwrap());

        view.refresh().await;
        assert_eq!(api.create_calls(), 0);
        assert!(view.log().is_none());
        assert!(view.take_notices().is_empty());
    }

    #[tokio::test]
    async fn tab_switches_with_existing_log_do_not_create() {
        let api = Arc::new(FakeApi::default());
        api.seed(make_log(today(), 250)).await;
        let mut view = view_with(&api);

        view.refresh().await;
        for tab in [Tab::Meals, Tab::Water, Tab::Daily] {
            view.select_tab(tab);
            view.refresh().await;
        }
        assert_eq!(api.create_calls(), 0);
        assert_eq!(view.log().unwrap().water_intake, 250);

        // Log-free tabs fetch nothing at all.
        let fetches = api.list_calls.load(Ordering::SeqCst);
        view.select_tab(Tab::Stats);
        view.refresh().await;
        assert_eq!(api.list_calls.load(Ordering::SeqCst), fetches);
    }

    #[tokio::test]
    async fn water_update_success_sets_amount() {
        let api = Arc::new(FakeApi::default());
        api.seed(make_log(today(), 0)).await;
        let mut view = view_with(&api);
        view.refresh().await;
        view.take_notices();

        view.update_water(1500).await;
        assert_eq!(view.log().unwrap().water_intake, 1500);
        let notices = view.take_notices();
        assert!(notices
            .iter()
            .any(|n| n.level == NoticeLevel::Success && n.message == "Water intake updated"));
    }

    #[tokio::test]
    async fn water_update_failure_restores_confirmed_value() {
        let api = Arc::new(FakeApi::default());
        api.seed(make_log(today(), 750)).await;
        let mut view = view_with(&api);
        view.refresh().await;
        view.take_notices();

        api.fail_water.store(true, Ordering::SeqCst);
        view.update_water(1500).await;

        assert_eq!(view.log().unwrap().water_intake, 750);
        let notices = view.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Failed to update water intake");
    }

    #[tokio::test]
    async fn water_update_without_log_creates_the_day() {
        let api = Arc::new(FakeApi::default());
        let mut view = view_with(&api);

        view.update_water(1500).await;
        assert_eq!(view.log().unwrap().water_intake, 1500);
        assert_eq!(api.create_calls(), 1);
        let notices = view.take_notices();
        assert!(notices
            .iter()
            .any(|n| n.level == NoticeLevel::Success && n.message == "Water intake updated"));
    }

    #[tokio::test]
    async fn manual_create_rejects_future_dates() {
        let api = Arc::new(FakeApi::default());
        let mut view = view_with(&api);
        view.select_date(today().next_day().unwrap());

        view.create_log().await;
        assert_eq!(api.create_calls(), 0);
        let notices = view.take_notices();
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(
            notices[0].message,
            "Cannot create nutrition log for future dates"
        );
    }

    #[tokio::test]
    async fn manual_create_works_for_past_dates() {
        let api = Arc::new(FakeApi::default());
        let mut view = view_with(&api);
        let yesterday = today().previous_day().unwrap();
        view.select_date(yesterday);

        view.create_log().await;
        assert_eq!(api.create_calls(), 1);
        assert_eq!(view.log().unwrap().date, yesterday);
    }

    #[tokio::test]
    async fn stale_fetch_result_is_discarded() {
        let api = Arc::new(FakeApi::default());
        let mut view = view_with(&api);

        let ticket = view.begin_fetch();
        view.select_date(today().previous_day().unwrap());

        let stale = ListEnvelope {
            count: 1,
            data: vec![make_log(today(), 999)],
        };
        view.apply_fetch(ticket, Ok(stale)).await;
        assert!(view.log().is_none());
    }

    #[tokio::test]
    async fn add_meal_replaces_log_and_closes_form() {
        let api = Arc::new(FakeApi::default());
        api.seed(make_log(today(), 0)).await;
        let mut view = view_with(&api);
        view.refresh().await;
        view.set_show_form(true);
        view.take_notices();

        view.add_meal(MealRequest {
            name: "Oatmeal".into(),
            meal_type: Some("breakfast".into()),
            calories: 320,
            protein_g: Some(11.5),
            carbs_g: None,
            fat_g: None,
        })
        .await;

        let log = view.log().unwrap();
        assert_eq!(log.meals.len(), 1);
        assert_eq!(log.meals[0].name, "Oatmeal");
        match view.view() {
            TabView::Daily { log } => assert_eq!(log.meals.len(), 1),
            other => panic!("expected daily view, got {other:?}"),
        }
        view.select_tab(Tab::Meals);
        match view.view() {
            TabView::Meals { show_form, .. } => assert!(!show_form),
            other => panic!("expected meals view, got {other:?}"),
        }
        assert!(view
            .take_notices()
            .iter()
            .any(|n| n.message == "Meal added"));
    }

    #[tokio::test]
    async fn log_free_tabs_render_without_a_log() {
        let api = Arc::new(FakeApi::default());
        let mut view = view_with(&api);
        view.select_tab(Tab::Goals);
        assert!(matches!(view.view(), TabView::Goals));
        view.select_tab(Tab::Planner);
        assert!(matches!(view.view(), TabView::Planner));
        view.select_tab(Tab::Stats);
        assert!(matches!(view.view(), TabView::Stats));
    }

    #[tokio::test]
    async fn missing_log_shows_no_data_prompt() {
        let api = Arc::new(FakeApi::default());
        let mut view = view_with(&api);
        let yesterday = today().previous_day().unwrap();
        view.select_date(yesterday);
        view.refresh().await;

        match view.view() {
            TabView::NoData { date } => assert_eq!(date, yesterday),
            other => panic!("expected no-data prompt, got {other:?}"),
        }
    }
}

//! Application state for the Kufah terminal client.
//!
//! `App` owns every piece of view state. Network work runs in spawned tasks
//! that report back through an mpsc channel drained once per UI tick.

use std::future::Future;

use anyhow::Result;
use chrono::{Datelike, Local, Months, NaiveDate};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use kufah_core::api::client::UNKNOWN_TOKEN_MESSAGE;
use kufah_core::attendance::{AttendancePanel, CloseRequest, SaveError, SaveReport};
use kufah_core::auth::{check_teacher_login, parse_link_token};
use kufah_core::dashboard::{self, CheckInRow, ClassRoster, StudentOverview};
use kufah_core::goals::{clamp_goal_input, GoalBoard, GoalCounter};
use kufah_core::import::read_roster_file;
use kufah_core::models::{
    no_school_window, AttendanceStatus, Class, ClassLinks, Event, GoalThresholds, MeetingDay, NewClass, NewEvent,
    NewStudent, NoSchoolDay, Question, QuestionAnswer, Student, ValidationError,
};
use kufah_core::{ApiClient, ApiError, Config};

// ============================================================================
// Constants
// ============================================================================

/// Capacity of the background result channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Rows moved by PageUp/PageDown
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum allowed password length
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum allowed link/token length
const MAX_TOKEN_LENGTH: usize = 512;

/// Maximum length of a single form field
const MAX_FIELD_LENGTH: usize = 500;

// ============================================================================
// UI State Types
// ============================================================================

/// Who is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Teacher,
    Student { student_id: i64, token: String },
}

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Classes,
    Students,
    Goals,
    Events,
    Questions,
    Progress,
    CheckIn,
}

pub const TEACHER_TABS: [Tab; 5] = [Tab::Classes, Tab::Students, Tab::Goals, Tab::Events, Tab::Questions];
pub const STUDENT_TABS: [Tab; 2] = [Tab::Progress, Tab::CheckIn];

impl Tab {
    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Classes => "Classes",
            Tab::Students => "Students",
            Tab::Goals => "Goals",
            Tab::Events => "Events",
            Tab::Questions => "Questions",
            Tab::Progress => "My Attendance",
            Tab::CheckIn => "Check In",
        }
    }

    /// Next tab within `tabs` (wrapping around)
    pub fn next_in(&self, tabs: &[Tab]) -> Tab {
        match tabs.iter().position(|t| t == self) {
            Some(i) => tabs[(i + 1) % tabs.len()],
            None => tabs.first().copied().unwrap_or(*self),
        }
    }

    /// Previous tab within `tabs` (wrapping around)
    pub fn prev_in(&self, tabs: &[Tab]) -> Tab {
        match tabs.iter().position(|t| t == self) {
            Some(i) => tabs[(i + tabs.len() - 1) % tabs.len()],
            None => tabs.first().copied().unwrap_or(*self),
        }
    }
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Events tab sub-view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventsView {
    Events,
    NoSchool,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    EditingForm,
    ViewingAttendance,
    ConfirmingDiscard,
    ConfirmingDelete,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Teacher,
    Student,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Mode,
    Username,
    Password,
    Token,
    Button,
}

impl LoginFocus {
    pub fn next(self, mode: LoginMode) -> LoginFocus {
        match (mode, self) {
            (_, LoginFocus::Mode) => match mode {
                LoginMode::Teacher => LoginFocus::Username,
                LoginMode::Student => LoginFocus::Token,
            },
            (LoginMode::Teacher, LoginFocus::Username) => LoginFocus::Password,
            (LoginMode::Teacher, LoginFocus::Password) => LoginFocus::Button,
            (LoginMode::Student, LoginFocus::Token) => LoginFocus::Button,
            (_, LoginFocus::Button) => LoginFocus::Mode,
            (_, _) => LoginFocus::Button,
        }
    }

    pub fn prev(self, mode: LoginMode) -> LoginFocus {
        match (mode, self) {
            (_, LoginFocus::Mode) => LoginFocus::Button,
            (LoginMode::Teacher, LoginFocus::Username) => LoginFocus::Mode,
            (LoginMode::Teacher, LoginFocus::Password) => LoginFocus::Username,
            (LoginMode::Student, LoginFocus::Token) => LoginFocus::Mode,
            (LoginMode::Teacher, LoginFocus::Button) => LoginFocus::Password,
            (LoginMode::Student, LoginFocus::Button) => LoginFocus::Token,
            (_, _) => LoginFocus::Mode,
        }
    }
}

// ============================================================================
// Forms
// ============================================================================

/// What a form creates or edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    NewStudent,
    EditStudent(i64),
    StudentClasses(i64),
    ImportRoster,
    NewClass,
    EditClass(i64),
    ClassLinks(i64),
    AddStudents(i64),
    NewEvent,
    EditEvent(i64),
    NoSchoolDay,
    AnswerQuestion(i64),
    EditGoals(i64),
}

impl FormKind {
    pub fn title(&self) -> &'static str {
        match self {
            FormKind::NewStudent => "New Student",
            FormKind::EditStudent(_) => "Edit Student",
            FormKind::StudentClasses(_) => "Student Classes",
            FormKind::ImportRoster => "Import Roster (CSV)",
            FormKind::NewClass => "New Class",
            FormKind::EditClass(_) => "Edit Class",
            FormKind::ClassLinks(_) => "Class Links",
            FormKind::AddStudents(_) => "Add Students to Class",
            FormKind::NewEvent => "New Event",
            FormKind::EditEvent(_) => "Edit Event",
            FormKind::NoSchoolDay => "Toggle No-School Day",
            FormKind::AnswerQuestion(_) => "Answer Question",
            FormKind::EditGoals(_) => "Daily Goals",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub hint: &'static str,
}

fn field(label: &'static str, value: impl Into<String>, hint: &'static str) -> FormField {
    FormField {
        label,
        value: value.into(),
        hint,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    pub fn new(kind: FormKind, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            fields,
            focus: 0,
            error: None,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(f) = self.fields.get_mut(self.focus) {
            if f.value.chars().count() < MAX_FIELD_LENGTH && is_valid_input_char(c) {
                f.value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(f) = self.fields.get_mut(self.focus) {
            f.value.pop();
        }
    }
}

/// Match comma-separated ids, emails or full names against the roster.
pub fn resolve_students(input: &str, students: &[Student]) -> Result<Vec<i64>, ValidationError> {
    let mut ids = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let found = token
            .parse::<i64>()
            .ok()
            .and_then(|id| students.iter().find(|s| s.id == id))
            .or_else(|| {
                students
                    .iter()
                    .find(|s| s.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(token)))
            })
            .or_else(|| students.iter().find(|s| s.full_name().eq_ignore_ascii_case(token)));
        match found {
            Some(student) if !ids.contains(&student.id) => ids.push(student.id),
            Some(_) => {}
            None => return Err(ValidationError::UnknownStudent(token.to_string())),
        }
    }
    Ok(ids)
}

/// Match comma-separated class ids or names.
pub fn resolve_classes(input: &str, classes: &[Class]) -> Result<Vec<i64>, ValidationError> {
    let mut ids = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let found = token
            .parse::<i64>()
            .ok()
            .and_then(|id| classes.iter().find(|c| c.id == id))
            .or_else(|| classes.iter().find(|c| c.name.eq_ignore_ascii_case(token)));
        match found {
            Some(class) if !ids.contains(&class.id) => ids.push(class.id),
            Some(_) => {}
            None => return Err(ValidationError::UnknownClass(token.to_string())),
        }
    }
    Ok(ids)
}

fn parse_yes_no(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes" | "true" | "1")
}

// ============================================================================
// Attendance panel overlay
// ============================================================================

/// The reconciliation panel as shown over the current tab.
///
/// `panel` is `None` while loading, and while a save owns it.
#[derive(Debug)]
pub struct PanelView {
    pub student_name: String,
    pub class_name: String,
    pub panel: Option<AttendancePanel>,
    pub selection: usize,
    pub saving: bool,
    pub error: Option<String>,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from background tasks back to the UI loop.
enum RefreshResult {
    Classes(Vec<Class>),
    Students(Vec<Student>),
    Rosters(Vec<ClassRoster>),
    GoalBoard(GoalBoard),
    Events(Vec<Event>),
    NoSchool(Vec<NoSchoolDay>),
    Questions(i64, Vec<Question>),
    StudentOverview(StudentOverview),
    CheckIn(Vec<CheckInRow>),
    StudentResolved { student_id: i64, token: String },
    LoginFailed(String),
    PanelLoaded(Result<AttendancePanel, String>),
    PanelSaved(AttendancePanel, Result<SaveReport, SaveError>),
    GoalsSaved(i64, GoalThresholds),
    CheckInMarked(i64, AttendanceStatus),
    /// A mutation succeeded; the message goes to the status bar
    ActionDone(String),
    RefreshComplete,
    Error(String),
}

/// Short, user-facing text for an error chain.
pub fn user_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<ApiError>() {
        Some(api) => api.user_message(),
        None => format!("{:#}", e),
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub role: Option<Role>,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub search_query: String,
    pub events_view: EventsView,

    // Login form state
    pub login_mode: LoginMode,
    pub login_username: String,
    pub login_password: String,
    pub login_token: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_pending: bool,

    // Teacher data
    pub classes: Vec<Class>,
    pub students: Vec<Student>,
    pub rosters: Vec<ClassRoster>,
    pub goal_board: GoalBoard,
    pub goal_day: NaiveDate,
    pub goal_counter: GoalCounter,
    pub events: Vec<Event>,
    pub upcoming_only: bool,
    pub no_school: Vec<NoSchoolDay>,
    pub no_school_month: NaiveDate,
    pub questions: Vec<Question>,
    pub questions_class: Option<i64>,

    // Shared student views
    pub student_overview: Option<StudentOverview>,
    pub check_in: Vec<CheckInRow>,

    // Selection indices
    pub class_selection: usize,
    pub roster_selection: usize,
    pub student_selection: usize,
    pub student_class_selection: usize,
    pub goal_selection: usize,
    pub event_selection: usize,
    pub no_school_selection: usize,
    pub question_class_selection: usize,
    pub question_selection: usize,
    pub progress_selection: usize,
    pub check_in_selection: usize,

    // Overlays
    pub form: Option<Form>,
    pub panel_view: Option<PanelView>,
    pub pending_delete: Option<i64>,

    // Status
    pub status_message: Option<String>,
    pub refreshing: bool,
    pub last_updated: Option<chrono::DateTime<Local>>,

    refresh_tx: mpsc::Sender<RefreshResult>,
    refresh_rx: mpsc::Receiver<RefreshResult>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config.api_url)?;
        let (refresh_tx, refresh_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let today = Local::now().date_naive();

        Ok(Self {
            config,
            api,
            role: None,
            state: AppState::LoggingIn,
            current_tab: Tab::Classes,
            focus: Focus::List,
            search_query: String::new(),
            events_view: EventsView::Events,
            login_mode: LoginMode::Teacher,
            login_username: String::new(),
            login_password: String::new(),
            login_token: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,
            login_pending: false,
            classes: Vec::new(),
            students: Vec::new(),
            rosters: Vec::new(),
            goal_board: GoalBoard::default(),
            goal_day: today,
            goal_counter: GoalCounter::Salawat,
            events: Vec::new(),
            upcoming_only: true,
            no_school: Vec::new(),
            no_school_month: today.with_day(1).unwrap_or(today),
            questions: Vec::new(),
            questions_class: None,
            student_overview: None,
            check_in: Vec::new(),
            class_selection: 0,
            roster_selection: 0,
            student_selection: 0,
            student_class_selection: 0,
            goal_selection: 0,
            event_selection: 0,
            no_school_selection: 0,
            question_class_selection: 0,
            question_selection: 0,
            progress_selection: 0,
            check_in_selection: 0,
            form: None,
            panel_view: None,
            pending_delete: None,
            status_message: None,
            refreshing: false,
            last_updated: None,
            refresh_tx,
            refresh_rx,
        })
    }

    /// Tabs available to the signed-in role
    pub fn tabs(&self) -> &'static [Tab] {
        match self.role {
            Some(Role::Student { .. }) => &STUDENT_TABS,
            _ => &TEACHER_TABS,
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.tabs().contains(&tab) {
            self.current_tab = tab;
            self.focus = Focus::List;
        }
    }

    pub fn select_tab_index(&mut self, index: usize) {
        if let Some(tab) = self.tabs().get(index).copied() {
            self.select_tab(tab);
        }
    }

    pub fn next_tab(&mut self) {
        let tab = self.current_tab.next_in(self.tabs());
        self.select_tab(tab);
    }

    pub fn prev_tab(&mut self) {
        let tab = self.current_tab.prev_in(self.tabs());
        self.select_tab(tab);
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = match self.login_mode {
            LoginMode::Teacher => LoginFocus::Username,
            LoginMode::Student => LoginFocus::Token,
        };
        self.login_error = None;
    }

    pub fn toggle_login_mode(&mut self) {
        self.login_mode = match self.login_mode {
            LoginMode::Teacher => LoginMode::Student,
            LoginMode::Student => LoginMode::Teacher,
        };
        self.login_error = None;
    }

    /// Attempt login with whatever the login form holds
    pub fn attempt_login(&mut self) {
        match self.login_mode {
            LoginMode::Teacher => self.attempt_teacher_login(),
            LoginMode::Student => {
                let token = self.login_token.clone();
                self.start_student_login(&token);
            }
        }
    }

    fn attempt_teacher_login(&mut self) {
        if self.login_username.trim().is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return;
        }

        match check_teacher_login(self.config.teacher.as_ref(), &self.login_username, &self.login_password) {
            Ok(()) => {
                info!("Teacher login successful");
                self.login_password.clear();
                self.login_error = None;
                self.role = Some(Role::Teacher);
                self.current_tab = Tab::Classes;
                self.focus = Focus::List;
                self.state = AppState::Normal;
                self.refresh_all_background();
            }
            Err(message) => {
                warn!("Teacher login rejected");
                self.login_error = Some(message.to_string());
            }
        }
    }

    /// Resolve a student link in the background
    pub fn start_student_login(&mut self, input: &str) {
        let Some(token) = parse_link_token(input) else {
            self.login_error = Some("Enter your link or token".to_string());
            return;
        };

        self.login_error = None;
        self.login_pending = true;
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            let result = match dashboard::resolve_student_token(&api, &token).await {
                Ok((student_id, token)) => RefreshResult::StudentResolved { student_id, token },
                Err(e) => {
                    error!(error = %e, "Student link resolution failed");
                    let message = match e.downcast_ref::<ApiError>() {
                        Some(ApiError::NotFound(_)) => UNKNOWN_TOKEN_MESSAGE.to_string(),
                        _ => user_message(&e),
                    };
                    RefreshResult::LoginFailed(message)
                }
            };
            Self::send_result(&tx, result).await;
        });
    }

    // =========================================================================
    // Background Data Refresh
    // =========================================================================

    async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
        if tx.send(result).await.is_err() {
            warn!("Result channel closed");
        }
    }

    async fn send_fetch_result<T>(
        tx: &mpsc::Sender<RefreshResult>,
        label: &str,
        result: Result<T>,
        wrap: fn(T) -> RefreshResult,
    ) {
        match result {
            Ok(data) => Self::send_result(tx, wrap(data)).await,
            Err(e) => {
                error!(what = label, error = %e, "Fetch failed");
                Self::send_result(tx, RefreshResult::Error(format!("Failed to load {}: {}", label, user_message(&e))))
                    .await;
            }
        }
    }

    /// Run one fetch in the background and deliver it through the channel.
    fn spawn_fetch<T, F>(&self, label: &'static str, fetch: F, wrap: fn(T) -> RefreshResult)
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            Self::send_fetch_result(&tx, label, fetch.await, wrap).await;
        });
    }

    /// Run a mutation in the background. Success reloads the current role's data.
    fn spawn_action<F>(&mut self, success: String, action: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let tx = self.refresh_tx.clone();
        self.status_message = Some("Saving...".to_string());
        tokio::spawn(async move {
            let result = match action.await {
                Ok(()) => RefreshResult::ActionDone(success),
                Err(e) => {
                    error!(error = %e, "Action failed");
                    RefreshResult::Error(user_message(&e))
                }
            };
            Self::send_result(&tx, result).await;
        });
    }

    /// Spawn a background task to refresh everything the current role shows
    pub fn refresh_all_background(&mut self) {
        match self.role.clone() {
            Some(Role::Teacher) => self.refresh_teacher_background(),
            Some(Role::Student { student_id, token }) => self.refresh_student_background(student_id, token),
            None => return,
        }
        self.refreshing = true;
        self.status_message = Some("Refreshing data...".to_string());
    }

    fn refresh_teacher_background(&self) {
        info!("Starting background refresh of teacher data");
        let tx = self.refresh_tx.clone();
        let api = self.api.clone();
        let goal_day = self.goal_day;
        let upcoming_only = self.upcoming_only;
        let month = self.no_school_month;
        let questions_class = self.questions_class;

        tokio::spawn(async move {
            Self::execute_teacher_refresh(tx, api, goal_day, upcoming_only, month, questions_class).await;
        });
    }

    async fn execute_teacher_refresh(
        tx: mpsc::Sender<RefreshResult>,
        api: ApiClient,
        goal_day: NaiveDate,
        upcoming_only: bool,
        month: NaiveDate,
        questions_class: Option<i64>,
    ) {
        let (from, to) = no_school_window(month);
        let (classes_res, students_res, events_res, no_school_res) = tokio::join!(
            api.fetch_classes(),
            api.fetch_students(),
            api.fetch_events(upcoming_only),
            api.fetch_no_school_days(from, to),
        );

        if let (Ok(classes), Ok(students)) = (&classes_res, &students_res) {
            let rosters_res = dashboard::load_class_rosters(&api, classes, students).await;
            Self::send_fetch_result(&tx, "class rosters", rosters_res, RefreshResult::Rosters).await;
        }
        Self::send_fetch_result(&tx, "classes", classes_res, RefreshResult::Classes).await;
        Self::send_fetch_result(&tx, "students", students_res, RefreshResult::Students).await;
        Self::send_fetch_result(&tx, "events", events_res, RefreshResult::Events).await;
        Self::send_fetch_result(&tx, "no-school days", no_school_res, RefreshResult::NoSchool).await;

        let board_res = dashboard::load_goal_board(&api, goal_day).await;
        Self::send_fetch_result(&tx, "goals", board_res, RefreshResult::GoalBoard).await;

        if let Some(class_id) = questions_class {
            let questions_res = api.fetch_questions(class_id).await;
            match questions_res {
                Ok(questions) => Self::send_result(&tx, RefreshResult::Questions(class_id, questions)).await,
                Err(e) => warn!(class_id, error = %e, "Failed to refresh questions"),
            }
        }

        info!("Background refresh complete");
        Self::send_result(&tx, RefreshResult::RefreshComplete).await;
    }

    fn refresh_student_background(&self, student_id: i64, token: String) {
        info!(student_id, "Starting background refresh of student data");
        let tx = self.refresh_tx.clone();
        let api = self.api.clone();

        tokio::spawn(async move {
            let (overview_res, check_in_res) = tokio::join!(
                dashboard::load_student_overview(&api, student_id),
                dashboard::load_check_in(&api, &token),
            );
            Self::send_fetch_result(&tx, "attendance", overview_res, RefreshResult::StudentOverview).await;
            Self::send_fetch_result(&tx, "check-in", check_in_res, RefreshResult::CheckIn).await;
            Self::send_result(&tx, RefreshResult::RefreshComplete).await;
        });
    }

    pub fn reload_goal_board(&mut self) {
        let api = self.api.clone();
        let day = self.goal_day;
        self.status_message = Some(format!("Loading goals for {}...", day.format("%a %b %-d")));
        self.spawn_fetch("goals", async move { dashboard::load_goal_board(&api, day).await }, RefreshResult::GoalBoard);
    }

    pub fn reload_events(&mut self) {
        let api = self.api.clone();
        let upcoming_only = self.upcoming_only;
        self.spawn_fetch("events", async move { api.fetch_events(upcoming_only).await }, RefreshResult::Events);
    }

    pub fn reload_no_school(&mut self) {
        let api = self.api.clone();
        let (from, to) = no_school_window(self.no_school_month);
        self.spawn_fetch(
            "no-school days",
            async move { api.fetch_no_school_days(from, to).await },
            RefreshResult::NoSchool,
        );
    }

    pub fn load_questions(&mut self, class_id: i64) {
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        self.questions_class = Some(class_id);
        self.question_selection = 0;
        tokio::spawn(async move {
            match api.fetch_questions(class_id).await {
                Ok(questions) => Self::send_result(&tx, RefreshResult::Questions(class_id, questions)).await,
                Err(e) => {
                    error!(class_id, error = %e, "Failed to load questions");
                    Self::send_result(&tx, RefreshResult::Error(user_message(&e))).await;
                }
            }
        });
    }

    pub fn load_student_overview(&mut self, student_id: i64) {
        let api = self.api.clone();
        self.student_class_selection = 0;
        self.spawn_fetch(
            "student attendance",
            async move { dashboard::load_student_overview(&api, student_id).await },
            RefreshResult::StudentOverview,
        );
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.refresh_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_refresh_result(result);
        }
    }

    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Classes(mut data) => {
                data.sort_by_key(|c| c.name.to_lowercase());
                self.classes = data;
                self.class_selection = self.class_selection.min(self.classes.len().saturating_sub(1));
            }
            RefreshResult::Students(mut data) => {
                data.sort_by_key(|s| s.display_name().to_lowercase());
                self.students = data;
                self.student_selection = self.student_selection.min(self.students.len().saturating_sub(1));
            }
            RefreshResult::Rosters(data) => {
                self.rosters = data;
            }
            RefreshResult::GoalBoard(mut board) => {
                board.set_query(self.goal_board.query());
                board.keep_unsaved_edits(&self.goal_board);
                self.goal_board = board;
                self.goal_selection = self.goal_selection.min(self.goal_board.rows().len().saturating_sub(1));
                if !self.refreshing {
                    self.status_message = None;
                }
            }
            RefreshResult::Events(data) => {
                self.events = data;
                self.events.sort_by(|a, b| a.starts_at().cmp(&b.starts_at()));
                self.event_selection = self.event_selection.min(self.events.len().saturating_sub(1));
            }
            RefreshResult::NoSchool(mut data) => {
                data.sort_by(|a, b| a.date.cmp(&b.date));
                self.no_school = data;
                self.no_school_selection = self.no_school_selection.min(self.no_school.len().saturating_sub(1));
            }
            RefreshResult::Questions(class_id, data) => {
                if self.questions_class == Some(class_id) {
                    self.questions = data;
                    self.question_selection = self.question_selection.min(self.questions.len().saturating_sub(1));
                }
            }
            RefreshResult::StudentOverview(overview) => {
                self.student_overview = Some(overview);
            }
            RefreshResult::CheckIn(rows) => {
                self.check_in = rows;
                self.check_in_selection = self.check_in_selection.min(self.check_in.len().saturating_sub(1));
            }
            RefreshResult::StudentResolved { student_id, token } => {
                info!(student_id, "Student login successful");
                self.login_pending = false;
                self.login_error = None;
                self.role = Some(Role::Student { student_id, token });
                self.current_tab = Tab::Progress;
                self.focus = Focus::List;
                self.state = AppState::Normal;
                self.refresh_all_background();
            }
            RefreshResult::LoginFailed(message) => {
                self.login_pending = false;
                self.login_error = Some(message);
                if self.role.is_none() {
                    self.state = AppState::LoggingIn;
                }
            }
            RefreshResult::PanelLoaded(result) => self.apply_panel_loaded(result),
            RefreshResult::PanelSaved(panel, result) => self.apply_panel_saved(panel, result),
            RefreshResult::GoalsSaved(student_id, goals) => {
                if let Some(row) = self.goal_board.row_mut(student_id) {
                    row.apply_saved(goals);
                }
                if let Some(student) = self.students.iter_mut().find(|s| s.id == student_id) {
                    student.set_goals(goals);
                }
                self.status_message = Some("Goals saved".to_string());
            }
            RefreshResult::CheckInMarked(record_id, status) => {
                if let Some(row) = self.check_in.iter_mut().find(|r| r.record.id == record_id) {
                    row.record.status = status;
                }
                self.status_message = Some(format!("Marked {}", status));
            }
            RefreshResult::ActionDone(message) => {
                self.status_message = Some(message);
                let keep = self.status_message.clone();
                self.refresh_all_background();
                self.status_message = keep;
            }
            RefreshResult::RefreshComplete => {
                self.refreshing = false;
                self.last_updated = Some(Local::now());
                if self.status_message.as_deref() == Some("Refreshing data...") {
                    self.status_message = None;
                }
            }
            RefreshResult::Error(message) => {
                self.status_message = Some(message);
            }
        }
    }

    // =========================================================================
    // Teacher views
    // =========================================================================

    pub fn selected_class(&self) -> Option<&Class> {
        self.classes.get(self.class_selection)
    }

    pub fn roster_for(&self, class_id: i64) -> Option<&ClassRoster> {
        self.rosters.iter().find(|r| r.class.id == class_id)
    }

    pub fn selected_roster(&self) -> Option<&ClassRoster> {
        self.selected_class().and_then(|c| self.roster_for(c.id))
    }

    /// Students matching the search query, in display order
    pub fn filtered_students(&self) -> Vec<&Student> {
        self.students
            .iter()
            .filter(|s| s.matches_query(&self.search_query))
            .collect()
    }

    pub fn selected_student(&self) -> Option<&Student> {
        self.filtered_students().get(self.student_selection).copied()
    }

    /// Names of the classes a student is enrolled in, per the loaded rosters
    pub fn class_names_for(&self, student_id: i64) -> Vec<String> {
        self.rosters
            .iter()
            .filter(|r| r.rows.iter().any(|row| row.student.id == student_id))
            .map(|r| r.class.name.clone())
            .collect()
    }

    pub fn selected_goal_student_id(&self) -> Option<i64> {
        self.goal_board
            .filtered()
            .get(self.goal_selection)
            .map(|row| row.student.id)
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.events.get(self.event_selection)
    }

    pub fn selected_question(&self) -> Option<&Question> {
        self.questions.get(self.question_selection)
    }

    pub fn set_search_query(&mut self, query: String) {
        self.goal_board.set_query(&query);
        self.search_query = query;
        self.student_selection = 0;
        self.goal_selection = 0;
    }

    pub fn shift_goal_day(&mut self, days: i64) {
        self.goal_day += chrono::Duration::days(days);
        self.reload_goal_board();
    }

    pub fn shift_no_school_month(&mut self, forward: bool) {
        let shifted = if forward {
            self.no_school_month.checked_add_months(Months::new(1))
        } else {
            self.no_school_month.checked_sub_months(Months::new(1))
        };
        if let Some(month) = shifted {
            self.no_school_month = month;
            self.no_school_selection = 0;
            self.reload_no_school();
        }
    }

    pub fn toggle_upcoming_only(&mut self) {
        self.upcoming_only = !self.upcoming_only;
        self.event_selection = 0;
        self.reload_events();
    }

    // =========================================================================
    // Goals
    // =========================================================================

    pub fn adjust_selected_goal(&mut self, delta: i64) {
        let counter = self.goal_counter;
        if let Some(id) = self.selected_goal_student_id() {
            if let Some(row) = self.goal_board.row_mut(id) {
                row.adjust_goal(counter, delta);
            }
        }
    }

    pub fn revert_selected_goal(&mut self) {
        if let Some(id) = self.selected_goal_student_id() {
            if let Some(row) = self.goal_board.row_mut(id) {
                row.revert();
            }
        }
    }

    /// Persist the selected row's goals (explicit per-row save)
    pub fn save_selected_goals(&mut self) {
        let Some(id) = self.selected_goal_student_id() else {
            return;
        };
        let Some(row) = self.goal_board.row(id) else {
            return;
        };
        if !row.is_dirty() {
            self.status_message = Some("No goal changes to save".to_string());
            return;
        }
        let goals = row.goals;
        self.save_goals(id, goals);
    }

    fn save_goals(&mut self, student_id: i64, goals: GoalThresholds) {
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        self.status_message = Some("Saving goals...".to_string());
        tokio::spawn(async move {
            let result = match api.update_student_goals(student_id, &goals).await {
                Ok(()) => RefreshResult::GoalsSaved(student_id, goals),
                Err(e) => {
                    error!(student_id, error = %e, "Failed to save goals");
                    RefreshResult::Error(format!("Failed to save goals: {}", user_message(&e)))
                }
            };
            Self::send_result(&tx, result).await;
        });
    }

    // =========================================================================
    // Attendance panel
    // =========================================================================

    pub fn open_attendance_panel(&mut self, student_id: i64, student_name: String, class_id: i64, class_name: String) {
        debug!(student_id, class_id, "Opening attendance panel");
        self.panel_view = Some(PanelView {
            student_name,
            class_name,
            panel: None,
            selection: 0,
            saving: false,
            error: None,
        });
        self.state = AppState::ViewingAttendance;

        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            let result = AttendancePanel::load(&api, student_id, class_id)
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to load attendance panel");
                    user_message(&e)
                });
            Self::send_result(&tx, RefreshResult::PanelLoaded(result)).await;
        });
    }

    fn apply_panel_loaded(&mut self, result: Result<AttendancePanel, String>) {
        let Some(view) = self.panel_view.as_mut() else {
            return;
        };
        match result {
            Ok(panel) => {
                view.panel = Some(panel);
                view.selection = 0;
            }
            Err(message) => {
                self.panel_view = None;
                if self.state == AppState::ViewingAttendance {
                    self.state = AppState::Normal;
                }
                self.status_message = Some(message);
            }
        }
    }

    pub fn set_panel_status(&mut self, status: AttendanceStatus) {
        if let Some(view) = self.panel_view.as_mut() {
            let selection = view.selection;
            if let Some(panel) = view.panel.as_mut() {
                if let Some(id) = panel.records().get(selection).map(|r| r.id) {
                    panel.set_status(id, status);
                    view.error = None;
                }
            }
        }
    }

    pub fn move_panel_selection(&mut self, down: bool) {
        if let Some(view) = self.panel_view.as_mut() {
            let len = view.panel.as_ref().map(|p| p.records().len()).unwrap_or(0);
            if len == 0 {
                return;
            }
            view.selection = if down {
                (view.selection + 1).min(len - 1)
            } else {
                view.selection.saturating_sub(1)
            };
        }
    }

    /// Save all changed rows. The panel moves into the task and comes back with the result.
    pub fn save_panel(&mut self) {
        let Some(view) = self.panel_view.as_mut() else {
            return;
        };
        if view.saving {
            return;
        }
        let Some(mut panel) = view.panel.take() else {
            return;
        };
        if !panel.has_unsaved_changes() {
            view.panel = Some(panel);
            self.status_message = Some("No changes to save".to_string());
            return;
        }

        view.saving = true;
        view.error = None;
        let count = panel.changed_count();
        self.status_message = Some(format!("Saving {} change{}...", count, if count == 1 { "" } else { "s" }));

        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            let result = panel.save(&api).await;
            Self::send_result(&tx, RefreshResult::PanelSaved(panel, result)).await;
        });
    }

    fn apply_panel_saved(&mut self, panel: AttendancePanel, result: Result<SaveReport, SaveError>) {
        let student_id = panel.student_id();
        match self.panel_view.as_mut() {
            Some(view) => {
                view.saving = false;
                view.panel = Some(panel);
                match &result {
                    Ok(_) => view.error = None,
                    Err(e) => view.error = Some(e.to_string()),
                }
            }
            None => return,
        }

        match result {
            Ok(report) => {
                info!(updated = report.updated, "Attendance saved");
                self.status_message = Some(format!(
                    "Saved {} change{}",
                    report.updated,
                    if report.updated == 1 { "" } else { "s" }
                ));
                self.refresh_after_attendance_change(student_id);
            }
            Err(e) => {
                warn!(failed = e.failed, attempted = e.attempted, "Attendance save partially failed");
                self.status_message = Some(e.to_string());
                self.refresh_after_attendance_change(student_id);
            }
        }
    }

    fn refresh_after_attendance_change(&mut self, student_id: i64) {
        let keep = self.status_message.clone();
        match self.role {
            Some(Role::Teacher) => {
                if self.current_tab == Tab::Students {
                    self.load_student_overview(student_id);
                }
                self.refresh_all_background();
            }
            Some(Role::Student { .. }) => self.refresh_all_background(),
            None => {}
        }
        self.status_message = keep;
    }

    /// Close the panel, asking first if there are unsaved edits
    pub fn request_close_panel(&mut self) {
        let Some(view) = self.panel_view.as_ref() else {
            self.state = AppState::Normal;
            return;
        };
        if view.saving {
            self.status_message = Some("Please wait for the save to finish".to_string());
            return;
        }
        let request = view.panel.as_ref().map(|p| p.request_close()).unwrap_or(CloseRequest::Closed);
        match request {
            CloseRequest::Closed => self.close_panel(),
            CloseRequest::NeedsConfirmation => self.state = AppState::ConfirmingDiscard,
        }
    }

    pub fn close_panel(&mut self) {
        self.panel_view = None;
        self.state = AppState::Normal;
    }

    // =========================================================================
    // Student check-in
    // =========================================================================

    pub fn mark_check_in(&mut self, status: AttendanceStatus) {
        let Some(row) = self.check_in.get(self.check_in_selection) else {
            return;
        };
        let record_id = row.record.id;
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            let result = match api.update_attendance_status(record_id, status).await {
                Ok(()) => RefreshResult::CheckInMarked(record_id, status),
                Err(e) => {
                    error!(record_id, error = %e, "Check-in failed");
                    RefreshResult::Error(format!("Check-in failed: {}", user_message(&e)))
                }
            };
            Self::send_result(&tx, result).await;
        });
    }

    // =========================================================================
    // Forms
    // =========================================================================

    fn open_form(&mut self, form: Form) {
        self.form = Some(form);
        self.state = AppState::EditingForm;
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    pub fn open_new_student_form(&mut self) {
        self.open_form(Form::new(
            FormKind::NewStudent,
            vec![
                field("First name", "", ""),
                field("Last name", "", ""),
                field("Email", "", "optional"),
                field("Phone", "", "optional"),
            ],
        ));
    }

    pub fn open_edit_student_form(&mut self) {
        let Some(student) = self.selected_student() else {
            return;
        };
        let current = NewStudent::from_student(student);
        let form = Form::new(
            FormKind::EditStudent(student.id),
            vec![
                field("First name", current.first_name, ""),
                field("Last name", current.last_name, ""),
                field("Email", current.email, "optional"),
                field("Phone", current.phone, "optional"),
            ],
        );
        self.open_form(form);
    }

    pub fn open_student_classes_form(&mut self) {
        let Some(id) = self.selected_student().map(|s| s.id) else {
            return;
        };
        let current = self.class_names_for(id).join(", ");
        self.open_form(Form::new(
            FormKind::StudentClasses(id),
            vec![field("Classes", current, "comma-separated names or ids; replaces all")],
        ));
    }

    pub fn open_import_form(&mut self) {
        self.open_form(Form::new(
            FormKind::ImportRoster,
            vec![field("CSV file", "", "path to a spreadsheet export with a header row")],
        ));
    }

    pub fn open_new_class_form(&mut self) {
        self.open_form(Form::new(
            FormKind::NewClass,
            vec![
                field("Name", "", ""),
                field("Time", "", "HH:MM or h:mm pm"),
                field("Days", "", "e.g. Mon, Wed"),
            ],
        ));
    }

    pub fn open_edit_class_form(&mut self) {
        let Some(class) = self.selected_class() else {
            return;
        };
        let days = class.days.iter().map(MeetingDay::label).collect::<Vec<_>>().join(", ");
        let form = Form::new(
            FormKind::EditClass(class.id),
            vec![
                field("Name", class.name.clone(), ""),
                field("Time", class.time.clone().unwrap_or_default(), "HH:MM or h:mm pm"),
                field("Days", days, "e.g. Mon, Wed"),
            ],
        );
        self.open_form(form);
    }

    pub fn open_class_links_form(&mut self) {
        let Some(class) = self.selected_class() else {
            return;
        };
        let form = Form::new(
            FormKind::ClassLinks(class.id),
            vec![
                field("Zoom link", class.zoom_link.clone().unwrap_or_default(), "blank clears"),
                field(
                    "Recordings folder",
                    class.recordings_folder_link.clone().unwrap_or_default(),
                    "blank clears",
                ),
            ],
        );
        self.open_form(form);
    }

    pub fn open_add_students_form(&mut self) {
        let Some(id) = self.selected_class().map(|c| c.id) else {
            return;
        };
        self.open_form(Form::new(
            FormKind::AddStudents(id),
            vec![field("Students", "", "comma-separated names, emails or ids")],
        ));
    }

    pub fn open_new_event_form(&mut self) {
        self.open_form(Form::new(
            FormKind::NewEvent,
            vec![
                field("Title", "", ""),
                field("Date/time", "", "YYYY-MM-DD HH:MM"),
                field("Description", "", "optional"),
            ],
        ));
    }

    pub fn open_edit_event_form(&mut self) {
        let Some(event) = self.selected_event() else {
            return;
        };
        let current = NewEvent::from_event(event);
        let form = Form::new(
            FormKind::EditEvent(event.id),
            vec![
                field("Title", current.title, ""),
                field("Date/time", current.event_date.replace('T', " "), "YYYY-MM-DD HH:MM"),
                field("Description", current.description.unwrap_or_default(), "optional"),
            ],
        );
        self.open_form(form);
    }

    pub fn open_no_school_form(&mut self) {
        let default = self
            .no_school
            .get(self.no_school_selection)
            .map(|d| d.date.chars().take(10).collect::<String>())
            .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());
        self.open_form(Form::new(
            FormKind::NoSchoolDay,
            vec![field("Date", default, "YYYY-MM-DD; toggles on/off")],
        ));
    }

    pub fn open_answer_form(&mut self) {
        let Some(question) = self.selected_question() else {
            return;
        };
        let form = Form::new(
            FormKind::AnswerQuestion(question.id),
            vec![
                field("Answer", question.answer.clone().unwrap_or_default(), "blank clears"),
                field("Public", if question.is_public { "y" } else { "n" }, "y/n"),
            ],
        );
        self.open_form(form);
    }

    pub fn open_goals_form(&mut self) {
        let Some(row) = self.selected_goal_student_id().and_then(|id| self.goal_board.row(id)) else {
            return;
        };
        let form = Form::new(
            FormKind::EditGoals(row.student.id),
            vec![
                field("Salawat", row.goals.salawat.to_string(), "per day"),
                field("Adhkar", row.goals.adhkar.to_string(), "per day"),
                field("Istighfar", row.goals.istighfar.to_string(), "per day"),
            ],
        );
        self.open_form(form);
    }

    /// Validate the open form and start its request. Validation errors keep
    /// the form open with the message shown inline.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let form = form.clone();
        match self.dispatch_form(&form) {
            Ok(()) => {
                if self.state == AppState::EditingForm {
                    self.close_form();
                }
            }
            Err(message) => {
                if let Some(open) = self.form.as_mut() {
                    open.error = Some(message);
                }
            }
        }
    }

    fn dispatch_form(&mut self, form: &Form) -> Result<(), String> {
        let api = self.api.clone();
        match form.kind {
            FormKind::NewStudent | FormKind::EditStudent(_) => {
                let student = NewStudent {
                    first_name: form.value(0).to_string(),
                    last_name: form.value(1).to_string(),
                    email: form.value(2).to_string(),
                    phone: form.value(3).to_string(),
                }
                .validate()
                .map_err(|e| e.to_string())?;
                let name = format!("{} {}", student.first_name, student.last_name);
                match form.kind {
                    FormKind::EditStudent(id) => self.spawn_action(format!("Updated {}", name), async move {
                        api.update_student(id, &student).await
                    }),
                    _ => self.spawn_action(format!("Added {}", name), async move {
                        api.create_student(&student).await
                    }),
                }
            }
            FormKind::StudentClasses(student_id) => {
                let class_ids = resolve_classes(form.value(0), &self.classes).map_err(|e| e.to_string())?;
                self.spawn_action("Class enrollment updated".to_string(), async move {
                    api.set_student_classes(student_id, class_ids).await
                });
            }
            FormKind::ImportRoster => {
                let path = form.value(0).trim();
                if path.is_empty() {
                    return Err(ValidationError::Required("CSV file").to_string());
                }
                let import = read_roster_file(std::path::Path::new(path)).map_err(|e| format!("{:#}", e))?;
                if import.students.is_empty() {
                    return Err(format!("Nothing to import: {}", import.summary()));
                }
                let summary = import.summary();
                info!(students = import.students.len(), skipped = import.skipped.len(), "Importing roster");
                self.spawn_action(format!("Imported {}", summary), async move {
                    api.import_students(&import.students).await
                });
            }
            FormKind::NewClass | FormKind::EditClass(_) => {
                let class =
                    NewClass::from_input(form.value(0), form.value(1), form.value(2)).map_err(|e| e.to_string())?;
                let name = class.name.clone();
                match form.kind {
                    FormKind::EditClass(id) => self.spawn_action(format!("Updated {}", name), async move {
                        api.update_class(id, &class).await
                    }),
                    _ => self.spawn_action(format!("Created {}", name), async move {
                        api.create_class(&class).await
                    }),
                }
            }
            FormKind::ClassLinks(class_id) => {
                let links = ClassLinks::from_input(form.value(0), form.value(1));
                self.spawn_action("Class links saved".to_string(), async move {
                    api.update_class_links(class_id, &links).await
                });
            }
            FormKind::AddStudents(class_id) => {
                let ids = resolve_students(form.value(0), &self.students).map_err(|e| e.to_string())?;
                if ids.is_empty() {
                    return Err(ValidationError::Required("Students").to_string());
                }
                let count = ids.len();
                self.spawn_action(
                    format!("Added {} student{}", count, if count == 1 { "" } else { "s" }),
                    async move { api.enroll_students(class_id, ids).await },
                );
            }
            FormKind::NewEvent | FormKind::EditEvent(_) => {
                let event =
                    NewEvent::from_input(form.value(0), form.value(1), form.value(2)).map_err(|e| e.to_string())?;
                match form.kind {
                    FormKind::EditEvent(id) => self.spawn_action("Event updated".to_string(), async move {
                        api.update_event(id, &event).await
                    }),
                    _ => self.spawn_action("Event created".to_string(), async move {
                        api.create_event(&event).await
                    }),
                }
            }
            FormKind::NoSchoolDay => {
                let raw = form.value(0).trim();
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| ValidationError::InvalidDate(raw.to_string()).to_string())?;
                self.toggle_no_school(date);
            }
            FormKind::AnswerQuestion(question_id) => {
                let answer = QuestionAnswer::new(form.value(0), parse_yes_no(form.value(1)));
                self.spawn_action("Answer published".to_string(), async move {
                    api.answer_question(question_id, &answer).await
                });
            }
            FormKind::EditGoals(student_id) => {
                let goals = GoalThresholds {
                    salawat: clamp_goal_input(form.value(0)),
                    adhkar: clamp_goal_input(form.value(1)),
                    istighfar: clamp_goal_input(form.value(2)),
                };
                if let Some(row) = self.goal_board.row_mut(student_id) {
                    row.goals = goals;
                }
                self.save_goals(student_id, goals);
            }
        }
        Ok(())
    }

    /// Mark a date as no-school, or clear it if it already is.
    pub fn toggle_no_school(&mut self, date: NaiveDate) {
        let api = self.api.clone();
        let exists = self.no_school.iter().any(|d| d.day() == Some(date));
        let label = date.format("%a %b %-d").to_string();
        if exists {
            self.spawn_action(format!("{} is a school day again", label), async move {
                api.remove_no_school_day(date).await
            });
        } else {
            let day = NoSchoolDay::new(date);
            self.spawn_action(format!("{} marked no-school", label), async move {
                api.add_no_school_day(&day).await
            });
        }
    }

    pub fn remove_selected_no_school(&mut self) {
        if let Some(date) = self.no_school.get(self.no_school_selection).and_then(|d| d.day()) {
            self.toggle_no_school(date);
        }
    }

    // =========================================================================
    // Deletes
    // =========================================================================

    pub fn request_delete_event(&mut self) {
        if let Some(id) = self.selected_event().map(|e| e.id) {
            self.pending_delete = Some(id);
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        if let Some(event_id) = self.pending_delete.take() {
            let api = self.api.clone();
            self.spawn_action("Event deleted".to_string(), async move { api.delete_event(event_id).await });
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Check if a link/token character should be accepted
pub fn can_add_token_char(current_len: usize, c: char) -> bool {
    current_len < MAX_TOKEN_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kufah_core::auth::{TeacherCredentials, INVALID_LOGIN_MESSAGE};
    use kufah_core::goals::GoalRow;
    use kufah_core::models::DailyProgress;

    fn student(id: i64, first: &str, last: &str, email: &str) -> Student {
        Student {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: Some(email.to_string()),
            phone: None,
            salawat_goal_daily: 0,
            adhkar_goal_daily: 0,
            istighfar_goal_daily: 0,
        }
    }

    fn class(id: i64, name: &str) -> Class {
        Class {
            id,
            name: name.to_string(),
            time: None,
            days: Vec::new(),
            zoom_link: None,
            recordings_folder_link: None,
        }
    }

    fn app_with_teacher() -> App {
        let config = Config {
            teacher: Some(TeacherCredentials::new("ustadh", "s3cret")),
            ..Config::default()
        };
        App::new(config).expect("app should build")
    }

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tab_cycling() {
        assert_eq!(Tab::Classes.next_in(&TEACHER_TABS), Tab::Students);
        assert_eq!(Tab::Questions.next_in(&TEACHER_TABS), Tab::Classes);
        assert_eq!(Tab::Classes.prev_in(&TEACHER_TABS), Tab::Questions);
        assert_eq!(Tab::CheckIn.next_in(&STUDENT_TABS), Tab::Progress);
        assert_eq!(Tab::Classes.next_in(&STUDENT_TABS), Tab::Progress);
    }

    #[test]
    fn test_student_role_limits_tabs() {
        let mut app = app_with_teacher();
        app.role = Some(Role::Student {
            student_id: 3,
            token: "abc".to_string(),
        });
        app.current_tab = Tab::Progress;
        app.select_tab(Tab::Goals);
        assert_eq!(app.current_tab, Tab::Progress);
        app.select_tab_index(1);
        assert_eq!(app.current_tab, Tab::CheckIn);
        app.select_tab_index(4);
        assert_eq!(app.current_tab, Tab::CheckIn);
    }

    #[test]
    fn test_login_focus_cycle() {
        let teacher = LoginMode::Teacher;
        assert_eq!(LoginFocus::Mode.next(teacher), LoginFocus::Username);
        assert_eq!(LoginFocus::Password.next(teacher), LoginFocus::Button);
        assert_eq!(LoginFocus::Button.next(teacher), LoginFocus::Mode);
        assert_eq!(LoginFocus::Button.prev(LoginMode::Student), LoginFocus::Token);
        assert_eq!(LoginFocus::Mode.next(LoginMode::Student), LoginFocus::Token);
    }

    // -------------------------------------------------------------------------
    // Login Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_teacher_login_rejects_bad_password() {
        let mut app = app_with_teacher();
        app.login_username = "ustadh".to_string();
        app.login_password = "nope".to_string();
        app.attempt_login();
        assert_eq!(app.login_error.as_deref(), Some(INVALID_LOGIN_MESSAGE));
        assert!(app.role.is_none());
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[test]
    fn test_teacher_login_requires_fields() {
        let mut app = app_with_teacher();
        app.attempt_login();
        assert_eq!(app.login_error.as_deref(), Some("Username and password required"));
    }

    #[tokio::test]
    async fn test_teacher_login_success() {
        let mut app = app_with_teacher();
        app.login_username = "ustadh".to_string();
        app.login_password = "s3cret".to_string();
        app.attempt_login();
        assert_eq!(app.role, Some(Role::Teacher));
        assert_eq!(app.state, AppState::Normal);
        assert!(app.login_password.is_empty());
        assert!(app.refreshing);
    }

    #[test]
    fn test_student_login_needs_token() {
        let mut app = app_with_teacher();
        app.login_mode = LoginMode::Student;
        app.login_token = "   ".to_string();
        app.attempt_login();
        assert_eq!(app.login_error.as_deref(), Some("Enter your link or token"));
        assert!(!app.login_pending);
    }

    // -------------------------------------------------------------------------
    // Form Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_form_editing() {
        let mut form = Form::new(
            FormKind::NewClass,
            vec![field("Name", "", ""), field("Time", "", ""), field("Days", "", "")],
        );
        form.push_char('Q');
        form.push_char('\n');
        form.focus_next();
        form.push_char('9');
        form.pop_char();
        form.push_char('8');
        form.focus_prev();
        form.focus_prev();
        assert_eq!(form.focus, 2);
        assert_eq!(form.value(0), "Q");
        assert_eq!(form.value(1), "8");
        assert_eq!(form.value(7), "");
    }

    #[test]
    fn test_invalid_form_stays_open_with_error() {
        let mut app = app_with_teacher();
        app.role = Some(Role::Teacher);
        app.open_new_class_form();
        if let Some(form) = app.form.as_mut() {
            form.fields[0].value = "Tajweed".to_string();
            form.fields[1].value = "18:00".to_string();
        }
        app.submit_form();
        assert_eq!(app.state, AppState::EditingForm);
        assert_eq!(
            app.form.as_ref().and_then(|f| f.error.clone()),
            Some(ValidationError::NoDays.to_string())
        );
    }

    #[test]
    fn test_resolve_students() {
        let students = vec![
            student(1, "Amina", "Khan", "amina@example.com"),
            student(2, "Bilal", "Ahmed", "bilal@example.com"),
        ];
        assert_eq!(resolve_students("1, BILAL AHMED, amina@example.com", &students), Ok(vec![1, 2]));
        assert_eq!(resolve_students(" , ", &students), Ok(vec![]));
        assert_eq!(
            resolve_students("Omar", &students),
            Err(ValidationError::UnknownStudent("Omar".to_string()))
        );
    }

    #[test]
    fn test_resolve_classes() {
        let classes = vec![class(4, "Tajweed"), class(5, "Fiqh")];
        assert_eq!(resolve_classes("fiqh, 4", &classes), Ok(vec![5, 4]));
        assert_eq!(resolve_classes("", &classes), Ok(vec![]));
        assert_eq!(
            resolve_classes("Art", &classes),
            Err(ValidationError::UnknownClass("Art".to_string()))
        );
    }

    #[test]
    fn test_parse_yes_no() {
        assert!(parse_yes_no(" Y "));
        assert!(parse_yes_no("yes"));
        assert!(!parse_yes_no("n"));
        assert!(!parse_yes_no(""));
    }

    // -------------------------------------------------------------------------
    // Panel Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_panel_close_asks_when_changed() {
        let mut app = app_viewing_absent_record();
        app.request_close_panel();
        assert!(app.panel_view.is_none());
        assert_eq!(app.state, AppState::Normal);

        let mut app = app_viewing_absent_record();
        app.set_panel_status(AttendanceStatus::Online);
        app.request_close_panel();
        assert_eq!(app.state, AppState::ConfirmingDiscard);
        assert!(app.panel_view.is_some());
    }

    fn app_viewing_absent_record() -> App {
        use kufah_core::models::AttendanceRecord;

        let mut app = app_with_teacher();
        let record = AttendanceRecord {
            id: 1,
            date: "2025-01-05".to_string(),
            student_id: 2,
            class_id: 3,
            status: AttendanceStatus::Absent,
            token: None,
        };
        app.panel_view = Some(PanelView {
            student_name: "A".to_string(),
            class_name: "B".to_string(),
            panel: Some(AttendancePanel::from_records(2, 3, vec![record])),
            selection: 0,
            saving: false,
            error: None,
        });
        app.state = AppState::ViewingAttendance;
        app
    }

    #[test]
    fn test_save_panel_without_changes() {
        let mut app = app_viewing_absent_record();
        app.save_panel();
        let view = app.panel_view.as_ref().expect("panel stays open");
        assert!(!view.saving);
        assert!(view.panel.is_some());
        assert_eq!(app.status_message.as_deref(), Some("No changes to save"));
    }

    #[tokio::test]
    async fn test_save_panel_hands_panel_to_task() {
        let mut app = app_viewing_absent_record();
        app.set_panel_status(AttendanceStatus::InPerson);
        app.save_panel();
        let view = app.panel_view.as_ref().expect("panel stays open");
        assert!(view.saving);
        assert!(view.panel.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Saving 1 change..."));

        // A second save while one is in flight is ignored
        app.save_panel();
        assert!(app.panel_view.as_ref().map(|v| v.saving).unwrap_or(false));
    }

    #[test]
    fn test_panel_saved_ok_returns_panel() {
        let mut app = app_viewing_absent_record();
        let panel = app
            .panel_view
            .as_mut()
            .and_then(|v| {
                v.saving = true;
                v.error = Some("old error".to_string());
                v.panel.take()
            })
            .expect("panel present");

        app.process_refresh_result(RefreshResult::PanelSaved(panel, Ok(SaveReport { updated: 1 })));

        let view = app.panel_view.as_ref().expect("panel stays open");
        assert!(!view.saving);
        assert!(view.panel.is_some());
        assert!(view.error.is_none());
        assert_eq!(app.state, AppState::ViewingAttendance);
        assert_eq!(app.status_message.as_deref(), Some("Saved 1 change"));
    }

    #[test]
    fn test_panel_saved_err_shows_inline_error() {
        let mut app = app_viewing_absent_record();
        app.set_panel_status(AttendanceStatus::Online);
        let panel = app
            .panel_view
            .as_mut()
            .and_then(|v| {
                v.saving = true;
                v.panel.take()
            })
            .expect("panel present");
        let error = SaveError {
            failed: 1,
            attempted: 1,
            first_error: "Server error (500)".to_string(),
        };

        app.process_refresh_result(RefreshResult::PanelSaved(panel, Err(error.clone())));

        let view = app.panel_view.as_ref().expect("panel stays open");
        assert!(!view.saving);
        assert_eq!(view.error, Some(error.to_string()));
        assert_eq!(view.panel.as_ref().map(|p| p.changed_count()), Some(1));
        assert_eq!(app.status_message, Some(error.to_string()));
    }

    #[test]
    fn test_panel_saved_after_close_is_dropped() {
        let mut app = app_viewing_absent_record();
        let panel = app.panel_view.as_mut().and_then(|v| v.panel.take()).expect("panel present");
        app.close_panel();

        app.process_refresh_result(RefreshResult::PanelSaved(panel, Ok(SaveReport { updated: 0 })));
        assert!(app.panel_view.is_none());
        assert_eq!(app.state, AppState::Normal);
    }

    // -------------------------------------------------------------------------
    // Goal Board Tests
    // -------------------------------------------------------------------------

    fn board_for(goals: (u32, u32, u32)) -> GoalBoard {
        let mut s = student(7, "Maryam", "Khan", "m@school.org");
        s.salawat_goal_daily = goals.0;
        s.adhkar_goal_daily = goals.1;
        s.istighfar_goal_daily = goals.2;
        GoalBoard::new(vec![GoalRow::new(s, DailyProgress::default())])
    }

    #[test]
    fn test_refresh_keeps_unsaved_goal_edits() {
        let mut app = app_with_teacher();
        app.goal_board = board_for((0, 0, 0));
        if let Some(row) = app.goal_board.row_mut(7) {
            row.adjust_goal(GoalCounter::Salawat, 5);
        }

        app.process_refresh_result(RefreshResult::GoalBoard(board_for((0, 2, 0))));

        assert_eq!(app.goal_board.dirty_count(), 1);
        let row = app.goal_board.row(7).expect("row present");
        assert_eq!(row.goals.salawat, 5);
        assert_eq!(row.student.adhkar_goal_daily, 2);
    }

    #[test]
    fn test_goals_saved_keeps_later_edit() {
        let mut app = app_with_teacher();
        app.goal_board = board_for((1, 1, 1));
        let sent = match app.goal_board.row_mut(7) {
            Some(row) => {
                row.set_goal(GoalCounter::Istighfar, 10);
                let sent = row.goals;
                row.set_goal(GoalCounter::Istighfar, 20);
                sent
            }
            None => panic!("row missing"),
        };

        app.process_refresh_result(RefreshResult::GoalsSaved(7, sent));

        let row = app.goal_board.row(7).expect("row present");
        assert_eq!(row.goals.istighfar, 20);
        assert_eq!(row.student.istighfar_goal_daily, 10);
        assert!(row.is_dirty());
        assert_eq!(app.status_message.as_deref(), Some("Goals saved"));

        let current = row_goals(&app);
        app.process_refresh_result(RefreshResult::GoalsSaved(7, current));
        assert_eq!(app.goal_board.dirty_count(), 0);
    }

    fn row_goals(app: &App) -> GoalThresholds {
        app.goal_board.row(7).map(|r| r.goals).unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_chars() {
        assert!(can_add_username_char(0, 'a'));
        assert!(!can_add_username_char(50, 'a'));
        assert!(!can_add_username_char(0, '\t'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(can_add_token_char(0, 'x'));
        assert!(!can_add_token_char(0, ' '));
    }
}

//! Navigation state machine.
//!
//! The visible page, the faculty dashboard step and the course/year/section
//! selectors are one value, [`View`], and every change to it goes through
//! [`transition`]. History side effects are returned as data ([`HistoryOp`]);
//! whether a push happens depends only on the event's [`Trigger`], so events
//! replayed from the host's history can never echo back as new entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Page {
    Landing,
    FacultyLogin,
    StudentLogin,
    FacultyDashboard,
    StudentDashboard,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Landing,
        Page::FacultyLogin,
        Page::StudentLogin,
        Page::FacultyDashboard,
        Page::StudentDashboard,
    ];

    pub fn container_id(self) -> &'static str {
        match self {
            Page::Landing => "landingPage",
            Page::FacultyLogin => "facultyLoginPage",
            Page::StudentLogin => "studentLoginPage",
            Page::FacultyDashboard => "facultyDashboard",
            Page::StudentDashboard => "studentDashboard",
        }
    }

    pub fn from_container_id(id: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.container_id() == id)
    }
}

/// Drill-down level inside the faculty dashboard. Ordered by depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Course,
    Year,
    Section,
    Students,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Course, Step::Year, Step::Section, Step::Students];

    pub fn container_id(self) -> &'static str {
        match self {
            Step::Course => "courseSelection",
            Step::Year => "yearSelection",
            Step::Section => "sectionSelection",
            Step::Students => "studentsActivities",
        }
    }

    /// Number of selectors (course, year, section) this step needs.
    fn depth(self) -> usize {
        match self {
            Step::Course => 0,
            Step::Year => 1,
            Step::Section => 2,
            Step::Students => 3,
        }
    }

    fn shallower(self) -> Step {
        match self {
            Step::Course | Step::Year => Step::Course,
            Step::Section => Step::Year,
            Step::Students => Step::Section,
        }
    }
}

/// Tabs of the students step. Switching tabs never touches history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tab {
    Students,
    Activities,
    SecondaryAdmins,
    Messages,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Students, Tab::Activities, Tab::SecondaryAdmins, Tab::Messages];

    pub fn container_id(self) -> &'static str {
        match self {
            Tab::Students => "studentsTab",
            Tab::Activities => "activitiesTab",
            Tab::SecondaryAdmins => "secondaryAdminsTab",
            Tab::Messages => "messagesTab",
        }
    }
}

/// Selector values supplied with a navigation request. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selectors {
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
}

impl Selectors {
    pub fn course(course: impl Into<String>) -> Self {
        Self {
            course: Some(course.into()),
            ..Self::default()
        }
    }

    pub fn year(year: impl Into<String>) -> Self {
        Self {
            year: Some(year.into()),
            ..Self::default()
        }
    }

    pub fn section(section: impl Into<String>) -> Self {
        Self {
            section: Some(section.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub course: Option<String>,
    pub year: Option<String>,
    pub section: Option<String>,
    pub selected_student: Option<String>,
}

impl Selection {
    /// Course, year and section when all three are set.
    pub fn section_scope(&self) -> Option<(&str, &str, &str)> {
        match (&self.course, &self.year, &self.section) {
            (Some(c), Some(y), Some(s)) => Some((c.as_str(), y.as_str(), s.as_str())),
            _ => None,
        }
    }

    fn check(&self, step: Step) -> Result<(), NavError> {
        let depth = step.depth();
        if depth >= 1 && self.course.is_none() {
            return Err(NavError::MissingSelector {
                step,
                missing: "course",
            });
        }
        if depth >= 2 && self.year.is_none() {
            return Err(NavError::MissingSelector {
                step,
                missing: "year",
            });
        }
        if depth >= 3 && self.section.is_none() {
            return Err(NavError::MissingSelector {
                step,
                missing: "section",
            });
        }
        Ok(())
    }

    fn truncate(&mut self, step: Step) {
        let depth = step.depth();
        if depth < 1 {
            self.course = None;
        }
        if depth < 2 {
            self.year = None;
        }
        if depth < 3 {
            self.section = None;
        }
    }
}

/// Opaque snapshot pushed to the host's history. Only the selectors relevant
/// to the step are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub page: Page,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl HistoryEntry {
    pub fn page(page: Page) -> Self {
        Self {
            page,
            step: None,
            course: None,
            year: None,
            section: None,
        }
    }
}

/// Who caused a navigation: the user (push a history entry) or the host's
/// history itself (never push).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    User,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum HistoryOp {
    Push { entry: HistoryEntry },
    Replace { entry: HistoryEntry },
    Back,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("{step:?} step requires a selected {missing}")]
    MissingSelector { step: Step, missing: &'static str },
    #[error("{0:?} step only exists on the faculty dashboard")]
    StepOutsideDashboard(Step),
    #[error("tabs are only available once a section is open")]
    NoTabs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub page: Page,
    pub step: Option<Step>,
    pub tab: Option<Tab>,
    pub selection: Selection,
}

impl Default for View {
    fn default() -> Self {
        Self::landing()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub id: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Containers {
    pub pages: Vec<Container>,
    pub sections: Vec<Container>,
    pub tabs: Vec<Container>,
}

impl View {
    pub fn landing() -> Self {
        Self {
            page: Page::Landing,
            step: None,
            tab: None,
            selection: Selection::default(),
        }
    }

    /// The history entry describing this view.
    pub fn entry(&self) -> HistoryEntry {
        let mut entry = HistoryEntry::page(self.page);
        if let Some(step) = self.step {
            entry.step = Some(step);
            let depth = step.depth();
            if depth >= 1 {
                entry.course = self.selection.course.clone();
            }
            if depth >= 2 {
                entry.year = self.selection.year.clone();
            }
            if depth >= 3 {
                entry.section = self.selection.section.clone();
            }
        }
        entry
    }

    /// Rebuild a view from a history entry. Entries whose selectors do not
    /// satisfy their step fall back to the deepest step they do satisfy.
    pub fn from_entry(entry: &HistoryEntry) -> Self {
        if entry.page != Page::FacultyDashboard {
            if let Some(step) = entry.step {
                debug!(page = ?entry.page, ?step, "ignoring step on non-dashboard entry");
            }
            return Self {
                page: entry.page,
                ..Self::landing()
            };
        }

        let mut selection = Selection {
            course: blank_to_none(entry.course.clone()),
            year: blank_to_none(entry.year.clone()),
            section: blank_to_none(entry.section.clone()),
            selected_student: None,
        };
        let requested = entry.step.unwrap_or(Step::Course);
        let mut step = requested;
        while selection.check(step).is_err() {
            step = step.shallower();
        }
        if step != requested {
            warn!(?requested, resolved = ?step, "history entry missing selectors");
        }
        selection.truncate(step);

        Self {
            page: Page::FacultyDashboard,
            step: Some(step),
            tab: (step == Step::Students).then_some(Tab::Students),
            selection,
        }
    }

    pub fn containers(&self) -> Containers {
        Containers {
            pages: Page::ALL
                .into_iter()
                .map(|p| Container {
                    id: p.container_id(),
                    active: p == self.page,
                })
                .collect(),
            sections: Step::ALL
                .into_iter()
                .map(|s| Container {
                    id: s.container_id(),
                    active: self.step == Some(s),
                })
                .collect(),
            tabs: Tab::ALL
                .into_iter()
                .map(|t| Container {
                    id: t.container_id(),
                    active: self.tab == Some(t),
                })
                .collect(),
        }
    }

    /// Heading shown above the current dashboard step.
    pub fn title(&self) -> Option<String> {
        let sel = &self.selection;
        let c = sel.course.as_deref().unwrap_or_default();
        let y = sel.year.as_deref().unwrap_or_default();
        let s = sel.section.as_deref().unwrap_or_default();
        match self.step? {
            Step::Course => None,
            Step::Year => Some(format!("{c} - Select Year")),
            Step::Section => Some(format!("{c} {y} - Select Section")),
            Step::Students => Some(format!("{c} > {y} > {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Navigate {
        page: Page,
        step: Option<Step>,
        selectors: Selectors,
        trigger: Trigger,
    },
    /// The host's history moved; `None` means it has no state for the entry.
    Replay(Option<HistoryEntry>),
    Back,
    Logout,
    /// First event of a session. `existing` is the host's current history
    /// state, `active` the page container it currently shows.
    Init {
        existing: Option<HistoryEntry>,
        active: Option<Page>,
    },
    SwitchTab(Tab),
    SelectStudent(Option<String>),
}

impl Event {
    pub fn trigger(&self) -> Trigger {
        match self {
            Event::Navigate { trigger, .. } => *trigger,
            Event::Replay(_) | Event::Init { .. } => Trigger::History,
            Event::Back | Event::Logout | Event::SwitchTab(_) | Event::SelectStudent(_) => {
                Trigger::User
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub view: View,
    pub history: Option<HistoryOp>,
}

pub fn transition(current: &View, event: Event) -> Result<Transition, NavError> {
    let trigger = event.trigger();
    match event {
        Event::Navigate {
            page,
            step,
            selectors,
            ..
        } => {
            let view = resolve(current, page, step, &selectors)?;
            let history = (trigger == Trigger::User).then(|| HistoryOp::Push {
                entry: view.entry(),
            });
            Ok(Transition { view, history })
        }
        Event::Replay(entry) => Ok(replay(current, entry)),
        Event::Back => Ok(go_back(current)),
        Event::Logout => Ok(logout()),
        Event::Init { existing, active } => match existing {
            Some(entry) => Ok(Transition {
                view: View::from_entry(&entry),
                history: None,
            }),
            None => {
                let entry = HistoryEntry::page(active.unwrap_or(Page::Landing));
                Ok(Transition {
                    view: View::from_entry(&entry),
                    history: Some(HistoryOp::Replace { entry }),
                })
            }
        },
        Event::SwitchTab(tab) => {
            if current.step != Some(Step::Students) {
                return Err(NavError::NoTabs);
            }
            let mut view = current.clone();
            view.tab = Some(tab);
            Ok(Transition {
                view,
                history: None,
            })
        }
        Event::SelectStudent(student) => {
            let mut view = current.clone();
            view.selection.selected_student = student;
            Ok(Transition {
                view,
                history: None,
            })
        }
    }
}

pub fn navigate_to(
    current: &View,
    page: Page,
    step: Option<Step>,
    selectors: Selectors,
) -> Result<Transition, NavError> {
    transition(
        current,
        Event::Navigate {
            page,
            step,
            selectors,
            trigger: Trigger::User,
        },
    )
}

/// Restores the view described by a history entry. Never pushes.
pub fn replay(_current: &View, entry: Option<HistoryEntry>) -> Transition {
    let view = entry
        .as_ref()
        .map(View::from_entry)
        .unwrap_or_else(View::landing);
    Transition {
        view,
        history: None,
    }
}

/// Landing page with every selector cleared, from any step.
pub fn logout() -> Transition {
    let view = View::landing();
    Transition {
        history: Some(HistoryOp::Push {
            entry: view.entry(),
        }),
        view,
    }
}

pub fn go_back(current: &View) -> Transition {
    Transition {
        view: current.clone(),
        history: Some(HistoryOp::Back),
    }
}

fn resolve(
    current: &View,
    page: Page,
    step: Option<Step>,
    selectors: &Selectors,
) -> Result<View, NavError> {
    let step = match (page, step) {
        (Page::FacultyDashboard, s) => s.unwrap_or(Step::Course),
        (_, Some(s)) => return Err(NavError::StepOutsideDashboard(s)),
        (_, None) => {
            return Ok(View {
                page,
                ..View::landing()
            })
        }
    };

    // A supplied selector that differs from the current one invalidates the
    // deeper current selectors.
    let from = if current.page == Page::FacultyDashboard {
        current.selection.clone()
    } else {
        Selection::default()
    };
    let mut inherit = true;
    let mut pick = |supplied: &Option<String>, existing: Option<String>| -> Option<String> {
        match blank_to_none(supplied.clone()) {
            Some(v) => {
                if existing.as_deref() != Some(v.as_str()) {
                    inherit = false;
                }
                Some(v)
            }
            None if inherit => existing,
            None => None,
        }
    };
    let mut selection = Selection {
        course: pick(&selectors.course, from.course),
        year: pick(&selectors.year, from.year),
        section: pick(&selectors.section, from.section),
        selected_student: None,
    };
    selection.truncate(step);
    selection.check(step)?;

    Ok(View {
        page,
        step: Some(step),
        tab: (step == Step::Students).then_some(Tab::Students),
        selection,
    })
}

fn blank_to_none(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

use std::{fmt::Write as _, str::FromStr, sync::Arc};

use client_core::{FlagSession, FlagsApi, SessionPhase};
use shared::{
    directory,
    domain::{FlagKey, FlagValue, OrgId},
};
use tracing::warn;

use crate::{
    orgs::OrgBrowser,
    view::{
        coerce_input, compose_rows, last_page, render_definitions, render_flags, toggle_intent,
        FlagGridState, ToggleIntent,
    },
};

pub const HELP: &str = "\
Organizations:
  orgs                 reload and show the current page of organizations
  next | prev          move one page forward or back
  orgpage <n>          jump to page n (0-based)
  orgsize <n>          rows per page: 10, 20, 50 or 100
Flags:
  load <org-id|#row>   select an organization and load its flags
  refresh              reload flags for the selected organization
  close                clear the selection
  show                 show the flag grid
  search [term]        filter by key, name or category; no term clears
  toggle <key|#row>    flip a boolean flag, or edit any other value
  set <key|#row> <v>   write a value (numbers are sent as numbers)
  page <n>             flag grid page (0-based)
  pagesize <n>         flag rows per page: 10, 50, 100, 150, 200 or 250
  definitions          list known flags
Other:
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgRef {
    Row(usize),
    Id(OrgId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagRef {
    Row(usize),
    Key(FlagKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Orgs,
    NextOrgs,
    PrevOrgs,
    OrgPage(u32),
    OrgPageSize(u32),
    Load(OrgRef),
    Refresh,
    Close,
    Show,
    Search(String),
    Toggle(FlagRef),
    Set(FlagRef, String),
    FlagPage(usize),
    FlagPageSize(usize),
    Definitions,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "orgs" => Command::Orgs,
            "next" => Command::NextOrgs,
            "prev" => Command::PrevOrgs,
            "orgpage" => Command::OrgPage(number(rest)?),
            "orgsize" => Command::OrgPageSize(number(rest)?),
            "load" | "select" => Command::Load(org_ref(rest)?),
            "refresh" => Command::Refresh,
            "close" => Command::Close,
            "show" | "flags" => Command::Show,
            "search" => Command::Search(rest.to_string()),
            "toggle" | "edit" => Command::Toggle(flag_ref(rest)?),
            "set" => {
                let (target, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "usage: set <key|#row> <value>".to_string())?;
                // Values keep inner whitespace; only the separator is dropped.
                Command::Set(flag_ref(target)?, value.trim_start().to_string())
            }
            "page" => Command::FlagPage(number(rest)?),
            "pagesize" => Command::FlagPageSize(number(rest)?),
            "definitions" | "defs" => Command::Definitions,
            "" => return Err("empty command".to_string()),
            other => return Err(format!("unknown command '{other}', try 'help'")),
        };
        Ok(command)
    }
}

fn number<T: FromStr>(raw: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("expected a number, got '{raw}'"))
}

fn org_ref(raw: &str) -> Result<OrgRef, String> {
    if raw.is_empty() {
        return Err("usage: load <org-id|#row>".to_string());
    }
    match raw.strip_prefix('#') {
        Some(row) => Ok(OrgRef::Row(number(row)?)),
        None => Ok(OrgRef::Id(OrgId::new(raw))),
    }
}

fn flag_ref(raw: &str) -> Result<FlagRef, String> {
    if raw.is_empty() {
        return Err("expected a flag key or #row".to_string());
    }
    if let Some(row) = raw.strip_prefix('#') {
        return Ok(FlagRef::Row(number(row)?));
    }
    FlagKey::from_str(&raw.to_ascii_uppercase())
        .map(FlagRef::Key)
        .map_err(|err| err.to_string())
}

/// Outcome of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Output(String),
    /// A non-boolean edit needs a value from the user before it can be sent.
    Prompt { key: FlagKey, current: String },
    Quit,
}

/// Front-end state shared by the interactive and one-shot modes.
pub struct AdminConsole {
    pub(crate) session: Arc<FlagSession>,
    pub(crate) orgs: OrgBrowser,
    pub(crate) grid: FlagGridState,
}

impl AdminConsole {
    pub fn new(api: Arc<dyn FlagsApi>) -> Self {
        Self {
            session: FlagSession::new(Arc::clone(&api)),
            orgs: OrgBrowser::new(api),
            grid: FlagGridState::default(),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Step {
        match command {
            Command::Help => Step::Output(HELP.to_string()),
            Command::Quit => Step::Quit,
            Command::Orgs => {
                self.orgs.reload().await;
                self.org_output().await
            }
            Command::NextOrgs => {
                self.orgs.next_page().await;
                self.org_output().await
            }
            Command::PrevOrgs => {
                self.orgs.prev_page().await;
                self.org_output().await
            }
            Command::OrgPage(page) => {
                self.orgs.load(page).await;
                self.org_output().await
            }
            Command::OrgPageSize(size) => match self.orgs.set_page_size(size).await {
                Ok(()) => self.org_output().await,
                Err(message) => Step::Output(message),
            },
            Command::Load(target) => {
                let org_id = match target {
                    OrgRef::Id(id) => id,
                    OrgRef::Row(number) => match self.orgs.row(number) {
                        Some(id) => id.clone(),
                        None => return Step::Output(format!("no organization in row {number}")),
                    },
                };
                self.grid.page = 0;
                self.session.select_org(Some(org_id)).await;
                self.flag_output().await
            }
            Command::Refresh => {
                self.session.refetch().await;
                self.flag_output().await
            }
            Command::Close => {
                self.session.select_org(None).await;
                self.flag_output().await
            }
            Command::Show => self.flag_output().await,
            Command::Search(term) => {
                self.grid.set_search(term);
                self.flag_output().await
            }
            Command::Toggle(target) => self.toggle(target).await,
            Command::Set(target, raw) => match self.resolve_flag(&target).await {
                Ok((key, _)) => self.write(key, coerce_input(&raw)).await,
                Err(message) => Step::Output(message),
            },
            Command::FlagPage(page) => {
                let snapshot = self.session.snapshot().await;
                let rows = compose_rows(&snapshot.values, &self.grid.search).len();
                self.grid.set_page(page, rows);
                self.flag_output().await
            }
            Command::FlagPageSize(size) => match self.grid.set_page_size(size) {
                Ok(()) => self.flag_output().await,
                Err(message) => Step::Output(message),
            },
            Command::Definitions => Step::Output(render_definitions(directory::definitions())),
        }
    }

    /// Sends the value typed in answer to [`Step::Prompt`].
    pub async fn submit_edit(&mut self, key: FlagKey, input: &str) -> Step {
        self.write(key, coerce_input(input)).await
    }

    async fn toggle(&mut self, target: FlagRef) -> Step {
        let (key, current) = match self.resolve_flag(&target).await {
            Ok(resolved) => resolved,
            Err(message) => return Step::Output(message),
        };
        let current = match current {
            Some(value) => value,
            None => directory::definition(key).default_value.clone(),
        };
        match toggle_intent(&current) {
            ToggleIntent::Write(value) => self.write(key, value).await,
            ToggleIntent::Prompt { current } => Step::Prompt { key, current },
        }
    }

    async fn write(&mut self, key: FlagKey, value: FlagValue) -> Step {
        let snapshot = self.session.snapshot().await;
        if snapshot.phase == SessionPhase::Loading {
            return Step::Output("flags are still loading, try again".to_string());
        }
        let mut out = String::new();
        if let Err(err) = self.session.toggle_flag(key, value).await {
            warn!(flag = %key, error = %err, "failed to toggle flag");
            let _ = writeln!(out, "Failed to toggle flag: {err}");
        }
        out.push_str(&render_flags(&self.session.snapshot().await, &self.grid));
        Step::Output(out)
    }

    /// Finds the flag a reference points at, with its stored value when the
    /// session has one. Keys resolve regardless of the search filter; row
    /// numbers index the filtered grid.
    async fn resolve_flag(&self, target: &FlagRef) -> Result<(FlagKey, Option<FlagValue>), String> {
        let snapshot = self.session.snapshot().await;
        let ready = snapshot.phase == SessionPhase::Ready;
        match target {
            FlagRef::Key(key) => {
                let stored = if ready {
                    snapshot.values.get(key.as_str()).cloned()
                } else {
                    None
                };
                Ok((*key, stored))
            }
            FlagRef::Row(number) => {
                let rows = if ready {
                    compose_rows(&snapshot.values, &self.grid.search)
                } else {
                    Vec::new()
                };
                number
                    .checked_sub(1)
                    .and_then(|index| rows.get(index))
                    .map(|row| (row.key(), Some(row.value.clone())))
                    .ok_or_else(|| format!("no flag in row {number}"))
            }
        }
    }

    async fn org_output(&self) -> Step {
        let selected = self.session.selected_org().await;
        Step::Output(self.orgs.render(selected.as_ref()))
    }

    async fn flag_output(&mut self) -> Step {
        let snapshot = self.session.snapshot().await;
        let rows = compose_rows(&snapshot.values, &self.grid.search).len();
        self.grid.page = self.grid.page.min(last_page(rows, self.grid.page_size));
        Step::Output(render_flags(&snapshot, &self.grid))
    }
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;

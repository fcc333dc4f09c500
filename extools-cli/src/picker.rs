use std::io::{self, BufRead, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use extools_core::Choice;
use ratatui::layout::{Constraint, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState};
use ratatui::{DefaultTerminal, Frame};

use crate::theme;

/// Case-insensitive subsequence match, as quick panels filter.
fn matches(filter: &str, name: &str) -> bool {
    let mut hay = name.chars().flat_map(char::to_lowercase);
    filter
        .chars()
        .flat_map(char::to_lowercase)
        .all(|c| hay.any(|h| h == c))
}

/// Indices into `names` that match `filter`, in list order.
pub fn filter_indices(names: &[String], filter: &str) -> Vec<usize> {
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| matches(filter, name))
        .map(|(i, _)| i)
        .collect()
}

/// Filterable list state for the terminal picker.
struct Picker<'a> {
    names: &'a [String],
    filter: String,
    visible: Vec<usize>,
    state: ListState,
}

impl<'a> Picker<'a> {
    fn new(names: &'a [String]) -> Self {
        let mut picker = Self {
            names,
            filter: String::new(),
            visible: Vec::new(),
            state: ListState::default(),
        };
        picker.refilter();
        picker
    }

    fn refilter(&mut self) {
        self.visible = filter_indices(self.names, &self.filter);
        let first = (!self.visible.is_empty()).then_some(0);
        self.state.select(first);
    }

    /// Index into `names` of the highlighted entry.
    fn current(&self) -> Option<usize> {
        self.state
            .selected()
            .and_then(|i| self.visible.get(i))
            .copied()
    }

    fn move_by(&mut self, delta: isize) {
        let Some(last) = self.visible.len().checked_sub(1) else {
            return;
        };
        let current = self.state.selected().unwrap_or(0);
        self.state
            .select(Some(current.saturating_add_signed(delta).min(last)));
    }

    /// Apply a key press. Returns the final choice once the user is done.
    fn handle_key(&mut self, key: KeyEvent) -> Option<Choice> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Some(Choice::Cancelled),
            KeyCode::Char('c') | KeyCode::Char('g') if ctrl => Some(Choice::Cancelled),
            KeyCode::Enter => self.current().map(Choice::Selected),
            KeyCode::Up => {
                self.move_by(-1);
                None
            }
            KeyCode::Down => {
                self.move_by(1);
                None
            }
            KeyCode::Char('p') if ctrl => {
                self.move_by(-1);
                None
            }
            KeyCode::Char('n') if ctrl => {
                self.move_by(1);
                None
            }
            KeyCode::Backspace => {
                if self.filter.pop().is_some() {
                    self.refilter();
                }
                None
            }
            KeyCode::Char(c) if !ctrl => {
                self.filter.push(c);
                self.refilter();
                None
            }
            _ => None,
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [prompt_area, list_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let prompt = Line::from(vec![
            Span::styled(format!("{} ", theme::PROMPT_CHAR), theme::prompt()),
            Span::styled(self.filter.as_str(), theme::filter()),
        ]);
        frame.render_widget(prompt, prompt_area);

        let names = self.names;
        let items: Vec<ListItem> = self
            .visible
            .iter()
            .map(|&i| ListItem::new(names[i].as_str()))
            .collect();
        let list = List::new(items)
            .style(theme::item())
            .highlight_style(theme::selected())
            .highlight_symbol(theme::SELECTED_MARK);
        frame.render_stateful_widget(list, list_area, &mut self.state);

        let hint = Line::styled("↑/↓ move · type to filter · enter run · esc cancel", theme::hint());
        frame.render_widget(hint, hint_area);
    }
}

/// Full-screen picker on the terminal.
pub fn pick(names: &[String]) -> io::Result<Choice> {
    let mut terminal = ratatui::try_init()?;
    let result = run(&mut terminal, names);
    ratatui::restore();
    result
}

fn run(terminal: &mut DefaultTerminal, names: &[String]) -> io::Result<Choice> {
    let mut picker = Picker::new(names);
    loop {
        terminal.draw(|frame| picker.draw(frame))?;
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(choice) = picker.handle_key(key)
        {
            return Ok(choice);
        }
    }
}

/// Line-based fallback when stdin is not a terminal: print a numbered list to
/// `out` and read one answer from `input`. Blank input or EOF cancels.
pub fn prompt(names: &[String], mut input: impl BufRead, mut out: impl Write) -> io::Result<Choice> {
    for (i, name) in names.iter().enumerate() {
        writeln!(out, "{:>3}  {name}", i + 1)?;
    }
    write!(out, "run [1-{}, blank to cancel]: ", names.len())?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(Choice::Cancelled);
    }
    Ok(parse_choice(&answer, names))
}

/// A 1-based number or an exact name; anything else cancels.
pub fn parse_choice(answer: &str, names: &[String]) -> Choice {
    let answer = answer.trim();
    if answer.is_empty() {
        return Choice::Cancelled;
    }
    if let Ok(n) = answer.parse::<i64>() {
        return match Choice::from_index(n.saturating_sub(1)) {
            Choice::Selected(i) if i < names.len() => Choice::Selected(i),
            _ => Choice::Cancelled,
        };
    }
    names
        .iter()
        .position(|name| name == answer)
        .map_or(Choice::Cancelled, Choice::Selected)
}

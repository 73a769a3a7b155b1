//! TUI module - terminal dashboard and workout runner with ratatui

use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use tokio::runtime::Handle;

use crate::GymFit;
use crate::auth::User;
use crate::catalog;
use crate::challenge::Challenge;
use crate::history::{HistoryEntry, format_elapsed};
use crate::workout::Workout;
use crate::workout::session::{SetOutcome, WorkoutSession};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const TAB_BAR: &str = "[1] Treinos  [2] Desafios  [3] Histórico";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Workouts,
    Challenges,
    History,
}

/// A workout being performed inside the TUI.
struct Runner {
    session: WorkoutSession,
    last_tick: Instant,
}

/// App state for TUI
pub struct App {
    gym: GymFit,
    user: User,
    workouts: Vec<Workout>,
    challenges: Vec<Challenge>,
    history: Vec<HistoryEntry>,
    tab: Tab,
    selected: usize,
    runner: Option<Runner>,
    status: Option<String>,
    should_quit: bool,
}

impl App {
    pub async fn new(gym: GymFit) -> Result<Self> {
        let user = gym.accounts.require_current().await?;
        let workouts = gym.workouts.list_for_user(user.id).await?;
        let challenges = gym.challenges.list().await?;
        let history = gym.history().await?;
        Ok(Self {
            gym,
            user,
            workouts,
            challenges,
            history,
            tab: Tab::Workouts,
            selected: 0,
            runner: None,
            status: None,
            should_quit: false,
        })
    }

    /// Jump straight into performing this workout.
    pub fn start_workout(&mut self, workout: Workout) {
        self.runner = Some(Runner {
            session: WorkoutSession::new(workout),
            last_tick: Instant::now(),
        });
        self.status = None;
    }

    /// Run the TUI loop. Blocking; storage calls go through `handle`.
    pub fn run(&mut self, handle: Handle) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            self.advance_timer();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events(&handle)?;
        }

        restore_terminal()?;
        Ok(())
    }

    /// Feed whole elapsed seconds into the running session.
    fn advance_timer(&mut self) {
        if let Some(runner) = self.runner.as_mut() {
            while runner.last_tick.elapsed() >= Duration::from_secs(1) {
                runner.session.tick();
                runner.last_tick += Duration::from_secs(1);
            }
        }
    }

    fn refresh(&mut self, handle: &Handle) -> Result<()> {
        self.user = handle.block_on(self.gym.accounts.require_current())?;
        self.workouts = handle.block_on(self.gym.workouts.list_for_user(self.user.id))?;
        self.challenges = handle.block_on(self.gym.challenges.list())?;
        self.history = handle.block_on(self.gym.history())?;
        if self.selected >= self.tab_len() {
            self.selected = 0;
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(4),
            ])
            .split(area);

        // Profile header
        let header = Paragraph::new(format!(
            "GymFit | {} | ⭐ {} XP | Nível {} (faltam {} XP)",
            self.user.name,
            self.user.xp,
            self.user.level(),
            self.user.xp_to_next_level(),
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        if let Some(runner) = &self.runner {
            render_runner(frame, chunks[1], runner);
        } else {
            match self.tab {
                Tab::Workouts => self.render_workouts(frame, chunks[1]),
                Tab::Challenges => self.render_challenges(frame, chunks[1]),
                Tab::History => self.render_history(frame, chunks[1]),
            }
        }

        // Footer: status line plus key help
        let help = if self.runner.is_some() {
            "espaço: pausar/continuar | enter: concluir série | f: finalizar | esc: abandonar"
        } else {
            "q: sair | 1/2/3: abas | j/k: navegar | enter: iniciar | c: concluir desafio | r: atualizar"
        };
        let footer_text = match &self.status {
            Some(message) => format!("{message}\n{help}"),
            None => help.to_string(),
        };
        let footer = Paragraph::new(footer_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn row_style(&self, index: usize) -> Style {
        if index == self.selected {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        }
    }

    fn render_workouts(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .workouts
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let goal = catalog::find_goal(&w.goal)
                    .map(|g| format!("{} {}", g.icon, g.label))
                    .unwrap_or_else(|| w.goal.clone());
                Row::new(vec![
                    Cell::from(w.name.clone()),
                    Cell::from(goal),
                    Cell::from(
                        w.duration_min
                            .map(|m| format!("{m} min"))
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    Cell::from(format!("{} exercícios", w.exercises.len())),
                ])
                .style(self.row_style(i))
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(20),
                Constraint::Length(22),
                Constraint::Length(8),
                Constraint::Length(15),
            ],
        )
        .header(Row::new(vec!["Treino", "Objetivo", "Duração", "Exercícios"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title(TAB_BAR));
        frame.render_widget(table, area);
    }

    fn render_challenges(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .challenges
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let icon = catalog::find_challenge_kind(&c.kind)
                    .map(|k| k.icon)
                    .unwrap_or("✨");
                Row::new(vec![
                    Cell::from(format!("{icon} {}", c.name)),
                    Cell::from(c.status.label()),
                    Cell::from(format!(
                        "{}/{} ({}%)",
                        c.progress,
                        c.effective_goal(),
                        c.percent()
                    )),
                    Cell::from(format!("⭐ {} XP", c.xp_reward)),
                    Cell::from(format!("por {}", c.creator_name)),
                ])
                .style(self.row_style(i))
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(20),
                Constraint::Length(22),
                Constraint::Length(14),
                Constraint::Length(10),
                Constraint::Length(18),
            ],
        )
        .header(Row::new(vec!["Desafio", "Status", "Progresso", "XP", "Criador"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title(TAB_BAR));
        frame.render_widget(table, area);
    }

    fn render_history(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .history
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                Row::new(vec![
                    Cell::from(entry.date.format("%Y-%m-%d %H:%M").to_string()),
                    Cell::from(entry.workout_name.clone()),
                    Cell::from(format_elapsed(entry.elapsed_secs)),
                    Cell::from(format!("+{} XP", entry.xp)),
                ])
                .style(self.row_style(i))
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(17),
                Constraint::Min(20),
                Constraint::Length(8),
                Constraint::Length(10),
            ],
        )
        .header(Row::new(vec!["Data", "Treino", "Tempo", "Pontos"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title(TAB_BAR));
        frame.render_widget(table, area);
    }

    fn handle_events(&mut self, handle: &Handle) -> Result<()> {
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if self.runner.is_some() {
                self.handle_runner_key(key.code, handle)?;
            } else {
                self.handle_dashboard_key(key.code, handle)?;
            }
        }
        Ok(())
    }

    fn handle_dashboard_key(&mut self, code: KeyCode, handle: &Handle) -> Result<()> {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => {
                self.refresh(handle)?;
                self.status = None;
            }
            KeyCode::Char('1') => self.switch_tab(Tab::Workouts),
            KeyCode::Char('2') => self.switch_tab(Tab::Challenges),
            KeyCode::Char('3') => self.switch_tab(Tab::History),
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Enter => match self.tab {
                Tab::Workouts => {
                    if let Some(workout) = self.workouts.get(self.selected).cloned() {
                        self.start_workout(workout);
                    }
                }
                Tab::Challenges => self.join_selected_challenge(handle)?,
                Tab::History => {}
            },
            KeyCode::Char('c') if self.tab == Tab::Challenges => {
                self.complete_selected_challenge(handle)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_runner_key(&mut self, code: KeyCode, handle: &Handle) -> Result<()> {
        match code {
            KeyCode::Char(' ') => {
                if let Some(runner) = self.runner.as_mut() {
                    if runner.session.is_paused() {
                        runner.session.resume();
                    } else {
                        runner.session.pause();
                    }
                }
            }
            KeyCode::Enter => {
                let done = self
                    .runner
                    .as_mut()
                    .map(|r| r.session.complete_set() == SetOutcome::WorkoutDone)
                    .unwrap_or(false);
                if done {
                    self.finish_workout(handle)?;
                }
            }
            KeyCode::Char('f') => self.finish_workout(handle)?,
            KeyCode::Esc => {
                self.runner = None;
                self.status = Some("Treino abandonado".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.selected = 0;
    }

    fn tab_len(&self) -> usize {
        match self.tab {
            Tab::Workouts => self.workouts.len(),
            Tab::Challenges => self.challenges.len(),
            Tab::History => self.history.len(),
        }
    }

    fn select_next(&mut self) {
        let len = self.tab_len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    fn select_prev(&mut self) {
        let len = self.tab_len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    fn join_selected_challenge(&mut self, handle: &Handle) -> Result<()> {
        let Some(id) = self.challenges.get(self.selected).map(|c| c.id) else {
            return Ok(());
        };
        match handle.block_on(self.gym.challenges.join(self.user.id, id)) {
            Ok(joined) => {
                self.status = Some(format!("Desafio iniciado: {}", joined.name));
                self.refresh(handle)?;
            }
            Err(err) => self.status = Some(err.to_string()),
        }
        Ok(())
    }

    fn complete_selected_challenge(&mut self, handle: &Handle) -> Result<()> {
        let Some(id) = self.challenges.get(self.selected).map(|c| c.id) else {
            return Ok(());
        };
        match handle.block_on(self.gym.complete_challenge(id)) {
            Ok(completed) => {
                self.status = Some(format!("Desafio concluído! +{} XP", completed.xp_reward));
                self.refresh(handle)?;
            }
            Err(err) => self.status = Some(err.to_string()),
        }
        Ok(())
    }

    fn finish_workout(&mut self, handle: &Handle) -> Result<()> {
        let Some(runner) = self.runner.as_ref() else {
            return Ok(());
        };
        match handle.block_on(self.gym.complete_workout(&runner.session)) {
            Ok(summary) => {
                let mut message = format!("Treino concluído! +{} XP", summary.xp_earned);
                if !summary.challenges_advanced.is_empty() {
                    message.push_str(&format!(
                        " | desafios atualizados: {}",
                        summary.challenges_advanced.join(", ")
                    ));
                }
                self.status = Some(message);
                self.runner = None;
                self.refresh(handle)?;
            }
            // too short: keep the session running, show the reason
            Err(err) => self.status = Some(err.to_string()),
        }
        Ok(())
    }
}

fn render_runner(frame: &mut Frame, area: Rect, runner: &Runner) {
    let session = &runner.session;
    let workout = session.workout();
    let (position, total) = session.progress();

    let mut lines = vec![
        Line::from(""),
        Line::styled(
            format!("Tempo Total  {}", format_elapsed(session.elapsed_secs())),
            Style::default().fg(Color::White).bold(),
        ),
    ];
    if session.rest_remaining() > 0 {
        lines.push(Line::styled(
            format!("⏸ Descanso  {}", format_elapsed(session.rest_remaining())),
            Style::default().fg(Color::Yellow),
        ));
    }
    if session.is_paused() {
        lines.push(Line::styled(
            "PAUSADO",
            Style::default().fg(Color::Red).bold(),
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(format!("Exercício {position} de {total}")));

    if let Some(exercise) = session.current_exercise() {
        lines.push(Line::styled(
            exercise.name.clone(),
            Style::default().fg(Color::Cyan).bold(),
        ));
        lines.push(Line::from(format!(
            "Série {} de {}",
            session.current_set(),
            exercise.sets
        )));
        lines.push(Line::from(format!("{} repetições", exercise.reps)));
    }

    let body = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Realizar Treino: {}", workout.name)),
    );
    frame.render_widget(body, area);
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

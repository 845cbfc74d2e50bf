//! Render-ready projection of the dialog
//!
//! [`DialogView`] is plain data: a terminal, web or native front end draws
//! it without knowing anything about the state machine. Copy is fixed
//! Brazilian Portuguese.

use serde::{Deserialize, Serialize};

use crate::countdown::{CountdownView, TimeFormatter};
use crate::level::{EscalationLevel, MAX_LEVEL, MIN_LEVEL};
use crate::note::{NoteDraft, MAX_NOTE_CHARS};
use crate::ticket::{Lifecycle, TicketId};

/// Inputs for [`DialogView::project`]
pub struct ViewInput<'a> {
    pub ticket: TicketId,
    pub level: EscalationLevel,
    pub lifecycle: Lifecycle,
    pub draft: &'a NoteDraft,
    pub remaining_secs: i64,
    pub busy: bool,
    pub open: bool,
    pub formatter: &'a dyn TimeFormatter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogView {
    pub ticket: TicketId,
    pub open: bool,
    pub header: HeaderView,
    pub countdown: CountdownView,
    pub progress: ProgressView,
    pub note: NoteView,
    pub actions: ActionsView,
    pub guidelines: Vec<Guideline>,
    /// Overlay shown while a transition is in flight
    pub processing: bool,
    pub processing_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderView {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub ticket_badge: String,
    pub status_badge: String,
    pub finalized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Active,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStep {
    pub level: EscalationLevel,
    pub label: String,
    pub short_label: String,
    pub state: StepState,
    /// "Em andamento" / "Concluído" under the step, if any
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressView {
    pub caption: String,
    pub steps: Vec<ProgressStep>,
    /// Fill of the connecting line, `(level - 1) / 4`
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteView {
    pub text: String,
    pub placeholder: String,
    pub counter: String,
    pub near_limit: bool,
    pub valid: bool,
    pub valid_label: Option<String>,
    /// False only while a transition is in flight
    pub editable: bool,
    /// Ticket is finalized; front ends may lock the field as well
    pub finalized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionControl {
    pub visible: bool,
    pub enabled: bool,
    pub label: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsView {
    pub previous: ActionControl,
    pub finish: ActionControl,
    pub next: ActionControl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guideline {
    pub title: String,
    pub text: String,
}

impl DialogView {
    pub fn project(input: ViewInput<'_>) -> Self {
        let finalized = input.lifecycle.is_finalized();
        let note_valid = input.draft.is_valid();

        Self {
            ticket: input.ticket,
            open: input.open,
            header: header(input.ticket, input.level, finalized),
            countdown: CountdownView::present(input.remaining_secs, input.formatter),
            progress: progress(input.level),
            note: note(input.draft, input.level, finalized, input.busy),
            actions: actions(input.level, finalized, note_valid, input.busy),
            guidelines: guidelines(),
            processing: input.busy,
            processing_label: "Processando ação...".to_string(),
        }
    }
}

fn header(ticket: TicketId, level: EscalationLevel, finalized: bool) -> HeaderView {
    let (title, subtitle, description) = if finalized {
        (
            "Chamado Finalizado",
            "Processo encerrado com sucesso",
            "O chamado foi resolvido e encerrado",
        )
    } else {
        let info = level.info();
        (info.title, info.subtitle, info.description)
    };

    HeaderView {
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        description: description.to_string(),
        ticket_badge: format!("Chamado {}", ticket),
        status_badge: if finalized { "Finalizado" } else { "Em Andamento" }.to_string(),
        finalized,
    }
}

fn progress(current: EscalationLevel) -> ProgressView {
    let steps = EscalationLevel::all()
        .map(|level| {
            let state = match level.cmp(&current) {
                std::cmp::Ordering::Less => StepState::Completed,
                std::cmp::Ordering::Equal => StepState::Active,
                std::cmp::Ordering::Greater => StepState::Pending,
            };
            let caption = match state {
                StepState::Completed => Some("Concluído".to_string()),
                StepState::Active => Some("Em andamento".to_string()),
                StepState::Pending => None,
            };
            ProgressStep {
                level,
                label: level.info().progress_label.to_string(),
                short_label: level.info().short_label.to_string(),
                state,
                caption,
            }
        })
        .collect();

    ProgressView {
        caption: format!("Nível {} de {}", current, MAX_LEVEL),
        steps,
        fraction: f64::from(current.get() - MIN_LEVEL) / f64::from(MAX_LEVEL - MIN_LEVEL),
    }
}

fn note(draft: &NoteDraft, level: EscalationLevel, finalized: bool, busy: bool) -> NoteView {
    let title = if finalized {
        "chamado finalizado".to_string()
    } else {
        level.info().title.to_lowercase()
    };
    let valid = draft.is_valid();

    NoteView {
        text: draft.as_str().to_string(),
        placeholder: format!(
            "Descreva detalhadamente as ações realizadas em {}, diagnósticos feitos, status atual e próximos passos recomendados...",
            title
        ),
        counter: format!("{}/{} caracteres", draft.char_count(), MAX_NOTE_CHARS),
        near_limit: draft.is_near_limit(),
        valid,
        valid_label: valid.then(|| "Observação válida".to_string()),
        editable: !busy,
        finalized,
    }
}

fn actions(level: EscalationLevel, finalized: bool, note_valid: bool, busy: bool) -> ActionsView {
    let ready = note_valid && !busy;

    let previous = ActionControl {
        visible: !level.is_first() && !finalized,
        enabled: ready,
        label: "Voltar Etapa".to_string(),
        caption: "Retornar ao nível anterior".to_string(),
    };

    let finish = ActionControl {
        visible: true,
        enabled: ready && !finalized,
        label: "Resolver Agora".to_string(),
        caption: "Finalizar chamado".to_string(),
    };

    let (label, caption) = if finalized {
        ("Finalizado".to_string(), "Chamado encerrado".to_string())
    } else if level.is_last() {
        ("Concluir Final".to_string(), "Última escalação".to_string())
    } else {
        (
            level.info().next_action.to_string(),
            "Avançar escalação".to_string(),
        )
    };
    let next = ActionControl {
        visible: true,
        enabled: ready && !finalized,
        label,
        caption,
    };

    ActionsView {
        previous,
        finish,
        next,
    }
}

fn guidelines() -> Vec<Guideline> {
    vec![
        Guideline {
            title: "Observações Obrigatórias".to_string(),
            text: "Documente todas as ações realizadas, diagnósticos e próximos passos."
                .to_string(),
        },
        Guideline {
            title: "Timer Renovado".to_string(),
            text: "Cada escalação reinicia o timer de 20 minutos automaticamente.".to_string(),
        },
        Guideline {
            title: "Resolução Rápida".to_string(),
            text: "Use \"Resolver Agora\" quando o problema estiver solucionado.".to_string(),
        },
    ]
}

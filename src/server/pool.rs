//! # Pool de Workers con Admisión
//! src/server/pool.rs
//!
//! Un número fijo de threads atiende conexiones. La admisión decide, bajo un
//! único mutex, si una conexión entra directo a un slot libre o espera en una
//! cola FIFO de desborde:
//!
//! ```text
//! submit_or_queue ──┬─ active < max ──▶ active += 1 ──▶ dispatch ──▶ worker
//!                   └─ saturado ──────▶ overflow (FIFO)
//!
//! worker termina ──┬─ overflow no vacío ─▶ toma el más antiguo (active igual)
//!                  └─ overflow vacío ────▶ active -= 1
//! ```
//!
//! El traspaso al terminar es 1:1: el slot liberado pasa directamente a la
//! conexión más antigua de la cola, sin volver a evaluar la admisión. Las
//! conexiones de la cola salen en orden de llegada; una conexión nueva que
//! encuentra un slot libre puede adelantarse si llega justo cuando se libera
//! uno.
//!
//! El lock solo se toma para tocar el contador y las colas, nunca durante
//! I/O.

use crate::error::ServerError;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

/// Función que procesa un elemento admitido
pub type Handler<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Resultado de una admisión exitosa
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Se asignó un slot libre
    Dispatched,
    /// Pool saturado; quedó en la cola de desborde en esta posición (1 = siguiente)
    Queued { position: usize },
}

/// El elemento no pudo entrar al pool; se devuelve al llamador
#[derive(Debug, Error)]
pub enum PoolError<T> {
    #[error("worker pool is shutting down")]
    ShutDown(T),
}

/// Foto del estado del pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub active: usize,
    pub queued: usize,
    pub max_threads: usize,
}

struct PoolState<T> {
    /// Slots ocupados (admitidos y aún no terminados)
    active: usize,
    /// Admitidos esperando que un thread ocioso los tome
    dispatch: VecDeque<T>,
    /// Desborde FIFO cuando todos los slots están ocupados
    overflow: VecDeque<T>,
    shutting_down: bool,
}

struct Shared<T> {
    state: Mutex<PoolState<T>>,
    /// Hay trabajo en `dispatch` (o se pidió apagar)
    work_ready: Condvar,
    /// `active` llegó a cero
    idle: Condvar,
    max_threads: usize,
    handler: Handler<T>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, PoolState<T>> {
        // Un panic del handler nunca ocurre con el lock tomado, así que un
        // mutex envenenado sigue teniendo un estado consistente.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Pool acotado de threads con cola de desborde
pub struct WorkerPool<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Crea el pool y arranca `max_threads` threads (`worker-1`..`worker-N`)
    pub fn new(max_threads: usize, handler: Handler<T>) -> Result<Self, ServerError> {
        if max_threads == 0 {
            return Err(ServerError::InvalidConfig(
                "worker pool needs at least one thread".to_string(),
            ));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                active: 0,
                dispatch: VecDeque::new(),
                overflow: VecDeque::new(),
                shutting_down: false,
            }),
            work_ready: Condvar::new(),
            idle: Condvar::new(),
            max_threads,
            handler,
        });

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(max_threads),
        };

        for i in 1..=max_threads {
            let shared = Arc::clone(&pool.shared);
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", i))
                .spawn(move || worker_loop(shared));
            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(e) => {
                    // Liberar los threads que sí arrancaron
                    pool.shutdown(Duration::ZERO);
                    return Err(ServerError::Spawn(e));
                }
            }
        }

        Ok(pool)
    }

    /// Admite `item` en un slot libre o lo encola al final del desborde
    pub fn submit_or_queue(&self, item: T) -> Result<Admission, PoolError<T>> {
        let mut state = self.shared.lock();
        if state.shutting_down {
            return Err(PoolError::ShutDown(item));
        }

        if state.active < self.shared.max_threads {
            state.active += 1;
            state.dispatch.push_back(item);
            info!(active = state.active, max = self.shared.max_threads, "thread pool status");
            drop(state);
            self.shared.work_ready.notify_one();
            Ok(Admission::Dispatched)
        } else {
            state.overflow.push_back(item);
            let position = state.overflow.len();
            warn!(queued = position, "thread pool saturated, queuing connection");
            Ok(Admission::Queued { position })
        }
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.shared.lock();
        PoolStats {
            active: state.active,
            queued: state.overflow.len(),
            max_threads: self.shared.max_threads,
        }
    }

    pub fn max_threads(&self) -> usize {
        self.shared.max_threads
    }

    /// Deja de aceptar trabajo y espera a que se drene lo pendiente
    ///
    /// Las conexiones en curso y las encoladas se atienden hasta el final;
    /// la espera se corta después de `grace`. Retorna `true` si el pool
    /// quedó vacío (y sus threads terminaron) dentro del plazo.
    pub fn shutdown(&mut self, grace: Duration) -> bool {
        // Un plazo que no cabe en un Instant equivale a esperar sin límite
        let deadline = Instant::now().checked_add(grace);
        let mut state = self.shared.lock();
        state.shutting_down = true;
        self.shared.work_ready.notify_all();

        while state.active > 0 {
            let Some(deadline) = deadline else {
                state = self
                    .shared
                    .idle
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                continue;
            };

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    active = state.active,
                    queued = state.overflow.len(),
                    "shutdown grace period elapsed, abandoning pending connections"
                );
                return false;
            }
            state = self
                .shared
                .idle
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
        drop(state);

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked outside a handler");
            }
        }
        true
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.shutting_down = true;
        drop(state);
        self.shared.work_ready.notify_all();
    }
}

fn worker_loop<T: Send + 'static>(shared: Arc<Shared<T>>) {
    loop {
        let mut item = {
            let mut state = shared.lock();
            loop {
                if let Some(item) = state.dispatch.pop_front() {
                    break item;
                }
                if state.shutting_down {
                    return;
                }
                state = shared
                    .work_ready
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
        };

        // Atender y, mientras haya desborde, seguir con el más antiguo
        loop {
            run_handler(&shared, item);

            let mut state = shared.lock();
            match state.overflow.pop_front() {
                Some(next) => {
                    info!(
                        remaining = state.overflow.len(),
                        "connection dequeued, assigned to {}",
                        thread::current().name().unwrap_or("worker")
                    );
                    item = next;
                }
                None => {
                    state.active -= 1;
                    info!(active = state.active, max = shared.max_threads, "thread pool status");
                    if state.active == 0 {
                        shared.idle.notify_all();
                    }
                    break;
                }
            }
        }
    }
}

fn run_handler<T>(shared: &Shared<T>, item: T) {
    let handler = &shared.handler;
    if panic::catch_unwind(AssertUnwindSafe(|| handler(item))).is_err() {
        error!("connection handler panicked; slot released");
    }
}

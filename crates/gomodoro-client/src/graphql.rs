//! GraphQL operation documents consumed from the gomodoro server.
//!
//! The shapes are server-defined; field selections mirror the schema exactly
//! so responses deserialize straight into the value types.

pub const CURRENT_POMODORO_QUERY: &str = "\
query CurrentPomodoro { currentPomodoro { \
id state taskId phase phaseCount phaseDurationSec remainingTimeSec elapsedTimeSec } }";

pub const START_POMODORO_MUTATION: &str = "\
mutation StartPomodoro($input: StartPomodoroInput!) { startPomodoro(input: $input) { \
id state taskId phase phaseCount phaseDurationSec remainingTimeSec elapsedTimeSec } }";

pub const PAUSE_POMODORO_MUTATION: &str = "\
mutation PausePomodoro { pausePomodoro { \
id state taskId phase phaseCount phaseDurationSec remainingTimeSec elapsedTimeSec } }";

pub const RESUME_POMODORO_MUTATION: &str = "\
mutation ResumePomodoro { resumePomodoro { \
id state taskId phase phaseCount phaseDurationSec remainingTimeSec elapsedTimeSec } }";

pub const STOP_POMODORO_MUTATION: &str = "\
mutation StopPomodoro { stopPomodoro { \
id state taskId phase phaseCount phaseDurationSec remainingTimeSec elapsedTimeSec } }";

pub const RESET_POMODORO_MUTATION: &str = "\
mutation ResetPomodoro { resetPomodoro { \
id state taskId phase phaseCount phaseDurationSec remainingTimeSec elapsedTimeSec } }";

pub const TASKS_QUERY: &str = "\
query Tasks { tasks { \
edges { cursor node { id title createdAt } } \
pageInfo { hasNextPage hasPreviousPage startCursor endCursor } \
totalCount } }";

pub const TASK_QUERY: &str = "\
query Task($id: ID!) { task(id: $id) { id title createdAt } }";

pub const CREATE_TASK_MUTATION: &str = "\
mutation CreateTask($input: CreateTaskInput!) { createTask(input: $input) { id title createdAt } }";

pub const UPDATE_TASK_MUTATION: &str = "\
mutation UpdateTask($input: UpdateTaskInput!) { updateTask(input: $input) { id title createdAt } }";

pub const DELETE_TASK_MUTATION: &str = "\
mutation DeleteTask($id: ID!) { deleteTask(id: $id) }";

pub const ON_POMODORO_EVENT_SUBSCRIPTION: &str = "\
subscription OnPomodoroEvent($input: EventReceivedInput!) { eventReceived(input: $input) { \
eventCategory eventType payload { __typename \
... on EventPomodoroPayload { \
id state taskId phase phaseCount phaseDurationSec remainingTimeSec elapsedTimeSec } \
... on EventTaskPayload { id title createdAt } } } }";

/// Trivial probe used by the health check.
pub const HEALTH_QUERY: &str = "{ __typename }";

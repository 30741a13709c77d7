//! Executor wiring shared by both line-search variants.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
    },
};
use argmin::core::{CostFunction, Executor, IterState, Solver, State};

/// Run `solver` on `problem` from `theta0` and normalize the final state.
///
/// `max_iters` comes from `opts.tols.max_iter`. With `opts.verbose`, the
/// initial log-likelihood and the termination status are logged at info
/// level, and with the `obs_slog` feature a terminal slog observer reports
/// every iteration.
///
/// # Errors
/// Argmin runtime errors (including objective failures boxed by the adapter)
/// and outcome validation errors.
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), (), (), f64>> + Send + 'static,
{
    if opts.verbose {
        let ll0 = -problem.cost(&theta0)?;
        log::info!("optimizer start: loglik(theta0) = {ll0:.6}");
    }

    let mut executor = Executor::new(problem, solver).configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        executor = executor.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut state = executor.run()?.state().clone();
    let iterations = state.get_iter();
    let fn_evals = state.get_func_counts().clone();
    let termination = state.get_termination_status().clone();
    let grad = state.take_gradient();
    let outcome = OptimOutcome::new(
        state.take_best_param(),
        -state.get_best_cost(),
        termination,
        iterations,
        fn_evals,
        grad,
    )?;

    if opts.verbose {
        log::info!(
            "optimizer done: {} after {} iterations, loglik = {:.6}",
            outcome.status,
            outcome.iterations,
            outcome.value
        );
    }
    Ok(outcome)
}
